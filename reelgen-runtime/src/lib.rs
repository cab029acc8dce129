pub mod config_store;
pub mod fs_util;
pub mod history;
pub mod synthesis;
