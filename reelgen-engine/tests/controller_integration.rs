use reelgen_core::script::ScriptError;
use reelgen_core::settings::{EffectiveSettings, GenerationOverrides, GenerationRequest, SettingsError};
use reelgen_core::types::{StyleId, VideoRecord};
use reelgen_engine::controller::{ControllerConfig, ControllerError, SessionController};
use reelgen_engine::session::{SessionHandle, SessionProgress, SessionState};
use reelgen_engine::traits::{JobId, ProviderStatus, RecordSink, SubmitAck, SynthesisProvider};
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SCRIPT: &str = "Welcome to our product launch event for the fall season";

#[derive(Default)]
struct MemorySink {
    records: StdMutex<Vec<VideoRecord>>,
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn insert(&self, record: VideoRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

struct FailingSink;

#[async_trait::async_trait]
impl RecordSink for FailingSink {
    async fn insert(&self, _record: VideoRecord) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk full"))
    }
}

#[derive(Default)]
struct GatedSink {
    records: StdMutex<Vec<VideoRecord>>,
    entered: tokio::sync::Notify,
    gate: tokio::sync::Notify,
}

#[async_trait::async_trait]
impl RecordSink for GatedSink {
    async fn insert(&self, record: VideoRecord) -> anyhow::Result<()> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

struct ScriptedProvider {
    ack: StdMutex<Option<anyhow::Result<SubmitAck>>>,
    statuses: StdMutex<VecDeque<ProviderStatus>>,
    polls: AtomicUsize,
}

impl ScriptedProvider {
    fn with_job(job: &str, statuses: impl IntoIterator<Item = ProviderStatus>) -> Arc<Self> {
        Arc::new(Self {
            ack: StdMutex::new(Some(Ok(SubmitAck {
                job_id: Some(JobId::new(job)),
                video_url: None,
            }))),
            statuses: StdMutex::new(statuses.into_iter().collect()),
            polls: AtomicUsize::new(0),
        })
    }

    fn with_url(url: &str) -> Arc<Self> {
        Arc::new(Self {
            ack: StdMutex::new(Some(Ok(SubmitAck {
                job_id: None,
                video_url: Some(url.into()),
            }))),
            statuses: StdMutex::new(VecDeque::new()),
            polls: AtomicUsize::new(0),
        })
    }

    fn failing_submit(message: &str) -> Arc<Self> {
        Arc::new(Self {
            ack: StdMutex::new(Some(Err(anyhow::anyhow!("{message}")))),
            statuses: StdMutex::new(VecDeque::new()),
            polls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl SynthesisProvider for ScriptedProvider {
    async fn submit(
        &self,
        _script: &str,
        _settings: &EffectiveSettings,
    ) -> anyhow::Result<SubmitAck> {
        self.ack
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(SubmitAck::default()))
    }

    async fn poll(&self, _job: &JobId) -> anyhow::Result<ProviderStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        // Once the script runs out the job just stays queued.
        Ok(next.unwrap_or(ProviderStatus::Queued))
    }
}

fn request(script: &str) -> GenerationRequest {
    GenerationRequest::new(script)
}

async fn wait_for_terminal(controller: &SessionController) -> SessionProgress {
    for _ in 0..20_000 {
        let p = controller.snapshot().await;
        if !matches!(p.state, SessionState::Running | SessionState::Idle) {
            return p;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("session never reached a terminal state");
}

#[tokio::test(start_paused = true)]
async fn simulated_session_completes_and_saves_a_record() {
    let sink = Arc::new(MemorySink::default());
    let controller = SessionController::new(ControllerConfig::default(), sink.clone());

    let mut req = request(SCRIPT);
    req.overrides = GenerationOverrides {
        duration_secs: Some(30),
        style: Some(StyleId::new("corporate")),
        ..Default::default()
    };

    controller.start(req).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Completed);
    assert_eq!(done.state_label, "completed");
    assert_eq!(done.percent, 100);
    assert_eq!(done.remaining_ms, 0);
    assert!(done.error.is_none());

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.title, "Welcome to our product launch…");
    assert_eq!(r.script, SCRIPT);
    assert_eq!(r.duration_secs, 30);
    assert_eq!(r.style.as_str(), "corporate");
    assert_eq!(r.thumbnail, "🏢");
    assert_eq!(r.video_url, None);
}

#[tokio::test(start_paused = true)]
async fn start_rejects_a_second_session_while_running() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    controller.start(request(SCRIPT)).await.unwrap();
    let err = controller.start(request(SCRIPT)).await.unwrap_err();
    assert!(matches!(err, ControllerError::SessionActive));

    // A terminal session accepts a new start.
    wait_for_terminal(&controller).await;
    controller.start(request(SCRIPT)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn invalid_scripts_are_rejected_before_starting() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    assert!(matches!(
        controller.start(request("   ")).await,
        Err(ControllerError::InvalidScript(ScriptError::Empty))
    ));
    assert!(matches!(
        controller.start(request("too short")).await,
        Err(ControllerError::InvalidScript(ScriptError::TooShort { .. }))
    ));

    let long = "a".repeat(2001);
    assert!(matches!(
        controller.start(request(&long)).await,
        Err(ControllerError::InvalidScript(ScriptError::TooLong { .. }))
    ));

    // Nothing started.
    assert_eq!(controller.snapshot().await.state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn invalid_settings_are_rejected_before_starting() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    let mut req = request(SCRIPT);
    req.overrides.duration_secs = Some(5);

    assert!(matches!(
        controller.start(req).await,
        Err(ControllerError::InvalidSettings(
            SettingsError::DurationOutOfRange(5)
        ))
    ));
}

#[tokio::test(start_paused = true)]
async fn validate_checks_a_request_without_starting() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    let resolved = controller.validate(&request(SCRIPT)).unwrap();
    assert_eq!(resolved.duration_secs, 60);

    let mut req = request(SCRIPT);
    req.overrides.voice_speed = Some(3.0);
    assert!(matches!(
        controller.validate(&req),
        Err(ControllerError::InvalidSettings(_))
    ));
    assert!(matches!(
        controller.validate(&request("hi")),
        Err(ControllerError::InvalidScript(_))
    ));

    assert_eq!(controller.snapshot().await.state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotone_and_ends_at_one_hundred() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    let seen: Arc<StdMutex<Vec<SessionProgress>>> = Arc::new(StdMutex::new(vec![]));
    let hook = {
        let seen = seen.clone();
        move |p: SessionProgress| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(p);
            }
        }
    };

    controller
        .start_with_hook(request(SCRIPT), hook)
        .await
        .unwrap();
    wait_for_terminal(&controller).await;

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert!(
            pair[1].percent >= pair[0].percent,
            "percent regressed: {} -> {}",
            pair[0].percent,
            pair[1].percent
        );
    }

    let last = seen.last().unwrap();
    assert_eq!(last.state, SessionState::Completed);
    assert_eq!(last.percent, 100);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_the_session_and_keeps_no_record() {
    let sink = Arc::new(MemorySink::default());
    let controller = SessionController::new(ControllerConfig::default(), sink.clone());

    let handle = controller.start(request(SCRIPT)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    controller.cancel(handle).await.unwrap();
    assert_eq!(controller.snapshot().await.state, SessionState::Cancelled);
    assert!(sink.records.lock().unwrap().is_empty());

    // Long after the aborted driver would have finished, nothing leaked through.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(controller.snapshot().await.state, SessionState::Cancelled);
    assert!(sink.records.lock().unwrap().is_empty());

    // Cancelled sessions accept a new start.
    controller.start(request(SCRIPT)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_requires_a_live_matching_handle() {
    let controller =
        SessionController::new(ControllerConfig::default(), Arc::new(MemorySink::default()));

    // Nothing running yet.
    let err = controller.cancel(SessionHandle { id: 1 }).await.unwrap_err();
    assert!(matches!(err, ControllerError::NotRunning));

    let handle = controller.start(request(SCRIPT)).await.unwrap();

    let stale = SessionHandle { id: handle.id + 1 };
    let err = controller.cancel(stale).await.unwrap_err();
    assert!(matches!(err, ControllerError::StaleHandle));

    controller.cancel(handle).await.unwrap();

    // A second cancel has nothing left to stop.
    let err = controller.cancel(handle).await.unwrap_err();
    assert!(matches!(err, ControllerError::NotRunning));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_record_save_waits_for_completion() {
    let sink = Arc::new(GatedSink::default());
    let controller = SessionController::new(ControllerConfig::default(), sink.clone());

    let handle = controller.start(request(SCRIPT)).await.unwrap();
    sink.entered.notified().await;

    // The save holds the session lock, so this cancel queues behind it.
    let cancel = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.cancel(handle).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!cancel.is_finished());

    sink.gate.notify_one();
    let err = cancel.await.unwrap().unwrap_err();
    assert!(matches!(err, ControllerError::NotRunning));

    // The session completed with its record intact; nothing reports Cancelled.
    let done = controller.snapshot().await;
    assert_eq!(done.state, SessionState::Completed);
    assert_eq!(done.percent, 100);
    assert_eq!(sink.records.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn provider_session_polls_until_success() {
    let sink = Arc::new(MemorySink::default());
    let provider = ScriptedProvider::with_job(
        "job-1",
        [
            ProviderStatus::Queued,
            ProviderStatus::Running,
            ProviderStatus::Succeeded {
                video_url: "https://cdn.example.com/v.mp4".into(),
            },
        ],
    );

    let controller =
        SessionController::with_provider(ControllerConfig::default(), provider.clone(), sink.clone());

    controller.start(request(SCRIPT)).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Completed);
    assert_eq!(done.percent, 100);
    assert_eq!(provider.polls.load(Ordering::SeqCst), 3);

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].video_url.as_deref(),
        Some("https://cdn.example.com/v.mp4")
    );
}

#[tokio::test(start_paused = true)]
async fn provider_failure_fails_the_session() {
    let sink = Arc::new(MemorySink::default());
    let provider = ScriptedProvider::with_job(
        "job-1",
        [ProviderStatus::Failed {
            message: "render crashed".into(),
        }],
    );
    let controller =
        SessionController::with_provider(ControllerConfig::default(), provider, sink.clone());

    controller.start(request(SCRIPT)).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Failed);
    assert_eq!(done.error.as_deref(), Some("render crashed"));
    assert!(sink.records.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn provider_timeout_hits_the_polling_deadline() {
    let sink = Arc::new(MemorySink::default());
    let provider = ScriptedProvider::with_job("job-1", []);
    let cfg = ControllerConfig {
        poll_deadline: Duration::from_secs(20),
        ..Default::default()
    };

    let seen: Arc<StdMutex<Vec<SessionProgress>>> = Arc::new(StdMutex::new(vec![]));
    let hook = {
        let seen = seen.clone();
        move |p: SessionProgress| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(p);
            }
        }
    };

    let controller = SessionController::with_provider(cfg, provider, sink.clone());
    controller
        .start_with_hook(request(SCRIPT), hook)
        .await
        .unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Failed);
    assert!(done.error.as_deref().unwrap_or_default().contains("deadline"));
    assert!(sink.records.lock().unwrap().is_empty());

    // While waiting on the provider the bar holds just under full.
    let seen = seen.lock().unwrap();
    let max_running = seen
        .iter()
        .filter(|p| p.state == SessionState::Running)
        .map(|p| p.percent)
        .max()
        .unwrap();
    assert_eq!(max_running, 99);
}

#[tokio::test(start_paused = true)]
async fn immediate_provider_url_completes_without_polling() {
    let sink = Arc::new(MemorySink::default());
    let provider = ScriptedProvider::with_url("https://cdn.example.com/fast.mp4");
    let controller =
        SessionController::with_provider(ControllerConfig::default(), provider.clone(), sink.clone());

    controller.start(request(SCRIPT)).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Completed);
    assert_eq!(provider.polls.load(Ordering::SeqCst), 0);
    assert_eq!(
        sink.records.lock().unwrap()[0].video_url.as_deref(),
        Some("https://cdn.example.com/fast.mp4")
    );
}

#[tokio::test(start_paused = true)]
async fn submit_error_fails_the_session() {
    let sink = Arc::new(MemorySink::default());
    let provider = ScriptedProvider::failing_submit("api key rejected");
    let controller =
        SessionController::with_provider(ControllerConfig::default(), provider, sink.clone());

    controller.start(request(SCRIPT)).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Failed);
    assert!(
        done.error
            .as_deref()
            .unwrap_or_default()
            .contains("api key rejected")
    );
    assert!(sink.records.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sink_failure_fails_the_session() {
    let controller = SessionController::new(ControllerConfig::default(), Arc::new(FailingSink));

    controller.start(request(SCRIPT)).await.unwrap();
    let done = wait_for_terminal(&controller).await;

    assert_eq!(done.state, SessionState::Failed);
    assert!(done.error.as_deref().unwrap_or_default().contains("disk full"));
}
