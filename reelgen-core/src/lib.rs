pub mod config;
pub mod script;
pub mod settings;
pub mod stage;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use script::*;
pub use settings::*;
pub use stage::*;
pub use types::*;
