use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelgen_core::settings::GenerationRequest;
use reelgen_core::stage::StagePlan;
use reelgen_engine::controller::{ControllerConfig, SessionController};
use reelgen_engine::session::{SessionProgress, SessionState};
use reelgen_runtime::config_store::ConfigStore;
use reelgen_runtime::history::{HistoryFilter, HistoryStore, RecoveryOutcome, seed_records};
use reelgen_runtime::synthesis::HttpSynthesisProvider;

const DEMO_SCRIPT: &str = "Welcome to our product launch event. Today we unveil the next \
    generation of our platform, with faster rendering, richer templates and a completely \
    reworked timeline.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Demo flow: runs one generation session end to end and prints the
    // resulting history. Set PROVIDER_API_KEY to call a real provider;
    // without it the session is simulated and finishes in about 12 seconds.

    let data_dir = PathBuf::from(
        std::env::var("REELGEN_DATA_DIR").unwrap_or_else(|_| ".reelgen".into()),
    );
    let api_key = std::env::var("PROVIDER_API_KEY").unwrap_or_default();

    let config_store = ConfigStore::at_path(data_dir.join("config.json"));
    let mut config = config_store.load_or_default();
    config.api_key_present = !api_key.trim().is_empty();
    if !config_store.path().exists() {
        config_store.save(&config)?;
        println!("wrote initial config to {}", config_store.path().display());
    }

    let base_url = std::env::var("PROVIDER_BASE_URL")
        .unwrap_or_else(|_| config.provider.base_url.clone());

    let history = Arc::new(
        HistoryStore::at_path(data_dir.join("history.json")).with_cap(config.history_cap),
    );
    match history.load_or_recover() {
        (_, RecoveryOutcome::FirstRun) => {
            let seeds = seed_records();
            history.persist(&seeds)?;
            println!("first run: seeded history with {} showcase videos", seeds.len());
        }
        (records, RecoveryOutcome::Loaded) => {
            println!("history: {} videos", records.len());
        }
        (_, RecoveryOutcome::Recovered { reason }) => {
            println!("history was unreadable ({reason}); starting empty");
        }
    }

    let controller_cfg = ControllerConfig {
        defaults: config.defaults.clone(),
        plan: StagePlan::standard(),
        tick: Duration::from_millis(250),
        poll_interval: Duration::from_millis(config.provider.poll_interval_ms),
        poll_deadline: Duration::from_secs(config.provider.poll_deadline_secs),
    };

    let controller = if config.api_key_present {
        println!("using provider at {base_url}");
        let provider = HttpSynthesisProvider::new(base_url, api_key);
        SessionController::with_provider(controller_cfg, Arc::new(provider), history.clone())
    } else {
        println!("no PROVIDER_API_KEY set; running a simulated session");
        SessionController::new(controller_cfg, history.clone())
    };

    let script = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEMO_SCRIPT.to_string());

    let printer = {
        let last_stage = Arc::new(tokio::sync::Mutex::new(String::new()));
        move |p: SessionProgress| {
            let last_stage = last_stage.clone();
            async move {
                if let Some(stage) = &p.stage_label {
                    let mut last = last_stage.lock().await;
                    if *last != *stage {
                        *last = stage.clone();
                        println!("[{:3}%] {stage}", p.percent);
                    }
                }
            }
        }
    };

    let _handle = controller
        .start_with_hook(GenerationRequest::new(script), printer)
        .await?;

    loop {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snap = controller.snapshot().await;
        match snap.state {
            SessionState::Completed => {
                println!("done in {:.1}s", snap.elapsed_ms as f64 / 1000.0);
                break;
            }
            SessionState::Failed => {
                println!("failed: {}", snap.error.unwrap_or_default());
                break;
            }
            SessionState::Cancelled => {
                println!("cancelled");
                break;
            }
            SessionState::Idle | SessionState::Running => {}
        }
    }

    println!("\nhistory (newest first):");
    for record in history.list(&HistoryFilter::default())? {
        println!(
            "  {} {} ({}s, {})",
            record.thumbnail,
            record.title,
            record.duration_secs,
            record.style.as_str()
        );
    }

    Ok(())
}
