use crate::session::{SessionHandle, SessionProgress, SessionState, ms, state_label};
use crate::traits::{Clock, ProviderStatus, RecordSink, SynthesisProvider, TokioClock};
use reelgen_core::script::{ScriptError, derive_title, thumbnail_for_style, validate_script};
use reelgen_core::settings::{
    EffectiveSettings, GenerationDefaults, GenerationRequest, SettingsError,
    resolve_effective_settings, validate_settings,
};
use reelgen_core::stage::{ProgressPoint, StagePlan};
use reelgen_core::types::{VideoId, VideoRecord};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("a generation session is already running")]
    SessionActive,
    #[error(transparent)]
    InvalidScript(#[from] ScriptError),
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
    #[error("no session is running")]
    NotRunning,
    #[error("handle does not match the current session")]
    StaleHandle,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub defaults: GenerationDefaults,
    pub plan: StagePlan,

    /// How often progress is recomputed while a session runs.
    pub tick: Duration,

    /// Minimum spacing between provider status polls.
    pub poll_interval: Duration,

    /// Give up on a provider job after this much total session time.
    pub poll_deadline: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            defaults: GenerationDefaults::default(),
            plan: StagePlan::standard(),
            tick: Duration::from_millis(250),
            poll_interval: Duration::from_secs(3),
            poll_deadline: Duration::from_secs(180),
        }
    }
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    session_id: u64,
    percent: u8,
    stage_index: usize,
    stage_label: Option<&'static str>,
    elapsed_ms: u64,
    remaining_ms: u64,
    error: Option<String>,

    // The session loop runs in a background task so callers stay responsive
    // and cancel can abort in-flight work.
    driver_task: Option<tokio::task::JoinHandle<()>>,
}

/// Owns the one-at-a-time generation session.
///
/// Progress is a pure function of elapsed time against the stage plan; the
/// driver task recomputes it on every tick and the controller only ever
/// stores the latest snapshot.
#[derive(Clone)]
pub struct SessionController {
    cfg: Arc<ControllerConfig>,
    clock: Arc<dyn Clock>,
    provider: Option<Arc<dyn SynthesisProvider>>,
    sink: Arc<dyn RecordSink>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionController {
    /// Controller without a provider: the session is purely timer-driven and
    /// the finished record carries no video url.
    pub fn new(cfg: ControllerConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_parts(cfg, None, sink, Arc::new(TokioClock))
    }

    pub fn with_provider(
        cfg: ControllerConfig,
        provider: Arc<dyn SynthesisProvider>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self::with_parts(cfg, Some(provider), sink, Arc::new(TokioClock))
    }

    pub fn with_parts(
        cfg: ControllerConfig,
        provider: Option<Arc<dyn SynthesisProvider>>,
        sink: Arc<dyn RecordSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cfg: Arc::new(cfg),
            clock,
            provider,
            sink,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub async fn snapshot(&self) -> SessionProgress {
        let inner = self.inner.lock().await;
        Self::payload(&inner)
    }

    /// Runs the same checks `start` applies, without starting a session.
    /// Callers can use this to reject a request before submission.
    pub fn validate(
        &self,
        request: &GenerationRequest,
    ) -> Result<EffectiveSettings, ControllerError> {
        validate_script(&request.script)?;
        let settings = resolve_effective_settings(&self.cfg.defaults, &request.overrides);
        validate_settings(&settings)?;
        Ok(settings)
    }

    pub async fn start(&self, request: GenerationRequest) -> Result<SessionHandle, ControllerError> {
        self.start_with_hook(request, |_progress| async {}).await
    }

    /// Starts a session and emits a progress hook after every update.
    ///
    /// The hook is intended for UI progress and must be fast. A terminal
    /// session (completed, failed or cancelled) accepts a new start.
    pub async fn start_with_hook<F, Fut>(
        &self,
        request: GenerationRequest,
        on_progress: F,
    ) -> Result<SessionHandle, ControllerError>
    where
        F: Fn(SessionProgress) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let settings = self.validate(&request)?;
        let script = request.script.trim().to_string();

        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Running {
            return Err(ControllerError::SessionActive);
        }

        // A terminal session should have no driver left, but don't leak one.
        if let Some(task) = inner.driver_task.take() {
            task.abort();
        }

        inner.session_id = inner.session_id.wrapping_add(1);
        let session_id = inner.session_id;

        let prev = inner.state;
        inner.state = SessionState::Running;
        log::info!("session state: {:?} -> {:?}", prev, SessionState::Running);

        let first = self.cfg.plan.progress_at(Duration::ZERO);
        inner.percent = first.percent;
        inner.stage_index = first.stage_index;
        inner.stage_label = Some(first.stage_label);
        inner.elapsed_ms = 0;
        inner.remaining_ms = ms(self.cfg.plan.total());
        inner.error = None;

        let started_at = self.clock.now();
        let controller = self.clone();
        inner.driver_task = Some(tokio::spawn(async move {
            controller
                .drive(session_id, started_at, script, settings, on_progress)
                .await;
        }));

        Ok(SessionHandle { id: session_id })
    }

    pub async fn cancel(&self, handle: SessionHandle) -> Result<(), ControllerError> {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Running {
            return Err(ControllerError::NotRunning);
        }
        if inner.session_id != handle.id {
            return Err(ControllerError::StaleHandle);
        }

        if let Some(task) = inner.driver_task.take() {
            task.abort();
        }

        // Bump the session id so late results from the aborted driver can't win.
        inner.session_id = inner.session_id.wrapping_add(1);

        let prev = inner.state;
        inner.state = SessionState::Cancelled;
        inner.error = None;
        log::info!("session state: {:?} -> {:?}", prev, SessionState::Cancelled);
        Ok(())
    }

    async fn drive<F, Fut>(
        &self,
        session_id: u64,
        started_at: Instant,
        script: String,
        settings: EffectiveSettings,
        on_progress: F,
    ) where
        F: Fn(SessionProgress) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self.provider.clone() {
            Some(provider) => {
                self.drive_provider(provider, session_id, started_at, script, settings, on_progress)
                    .await
            }
            None => {
                self.drive_simulated(session_id, started_at, script, settings, on_progress)
                    .await
            }
        }
    }

    async fn drive_simulated<F, Fut>(
        &self,
        session_id: u64,
        started_at: Instant,
        script: String,
        settings: EffectiveSettings,
        on_progress: F,
    ) where
        F: Fn(SessionProgress) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            tokio::time::sleep(self.cfg.tick).await;
            let elapsed = self.clock.now().duration_since(started_at);
            let point = self.cfg.plan.progress_at(elapsed);

            if point.percent >= 100 {
                if let Some(p) = self
                    .finish_completed(session_id, elapsed, &script, &settings, None)
                    .await
                {
                    on_progress(p).await;
                }
                return;
            }

            let Some(p) = self.apply_progress(session_id, elapsed, &point, 100).await else {
                return;
            };
            on_progress(p).await;
        }
    }

    async fn drive_provider<F, Fut>(
        &self,
        provider: Arc<dyn SynthesisProvider>,
        session_id: u64,
        started_at: Instant,
        script: String,
        settings: EffectiveSettings,
        on_progress: F,
    ) where
        F: Fn(SessionProgress) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ack = match provider.submit(&script, &settings).await {
            Ok(ack) => ack,
            Err(e) => {
                log::warn!("provider submit failed: {e:#}");
                let elapsed = self.clock.now().duration_since(started_at);
                if let Some(p) = self
                    .finish_failed(session_id, elapsed, format!("video generation failed: {e}"))
                    .await
                {
                    on_progress(p).await;
                }
                return;
            }
        };

        if let Some(url) = ack.video_url {
            let elapsed = self.clock.now().duration_since(started_at);
            if let Some(p) = self
                .finish_completed(session_id, elapsed, &script, &settings, Some(url))
                .await
            {
                on_progress(p).await;
            }
            return;
        }

        let Some(job_id) = ack.job_id else {
            let elapsed = self.clock.now().duration_since(started_at);
            if let Some(p) = self
                .finish_failed(
                    session_id,
                    elapsed,
                    "provider returned neither a video url nor a job id".into(),
                )
                .await
            {
                on_progress(p).await;
            }
            return;
        };

        let mut last_poll = self.clock.now();
        loop {
            tokio::time::sleep(self.cfg.tick).await;
            let now = self.clock.now();
            let elapsed = now.duration_since(started_at);

            if elapsed >= self.cfg.poll_deadline {
                if let Some(p) = self
                    .finish_failed(
                        session_id,
                        elapsed,
                        format!(
                            "provider polling deadline exceeded after {}s",
                            self.cfg.poll_deadline.as_secs()
                        ),
                    )
                    .await
                {
                    on_progress(p).await;
                }
                return;
            }

            if now.duration_since(last_poll) >= self.cfg.poll_interval {
                last_poll = now;
                match provider.poll(&job_id).await {
                    Ok(ProviderStatus::Succeeded { video_url }) => {
                        if let Some(p) = self
                            .finish_completed(
                                session_id,
                                elapsed,
                                &script,
                                &settings,
                                Some(video_url),
                            )
                            .await
                        {
                            on_progress(p).await;
                        }
                        return;
                    }
                    Ok(ProviderStatus::Failed { message }) => {
                        if let Some(p) = self.finish_failed(session_id, elapsed, message).await {
                            on_progress(p).await;
                        }
                        return;
                    }
                    Ok(ProviderStatus::Queued | ProviderStatus::Running) => {}
                    Err(e) => {
                        // Transient poll failures are retried until the deadline.
                        log::warn!("provider poll failed: {e:#}");
                    }
                }
            }

            // Hold below 100 until the provider actually reports success.
            let point = self.cfg.plan.progress_at(elapsed);
            let Some(p) = self.apply_progress(session_id, elapsed, &point, 99).await else {
                return;
            };
            on_progress(p).await;
        }
    }

    async fn apply_progress(
        &self,
        session_id: u64,
        elapsed: Duration,
        point: &ProgressPoint,
        cap: u8,
    ) -> Option<SessionProgress> {
        let mut inner = self.inner.lock().await;
        if inner.session_id != session_id || inner.state != SessionState::Running {
            return None;
        }

        inner.percent = point.percent.min(cap);
        inner.stage_index = point.stage_index;
        inner.stage_label = Some(point.stage_label);
        inner.elapsed_ms = ms(elapsed);
        inner.remaining_ms = ms(point.remaining);
        Some(Self::payload(&inner))
    }

    async fn finish_completed(
        &self,
        session_id: u64,
        elapsed: Duration,
        script: &str,
        settings: &EffectiveSettings,
        video_url: Option<String>,
    ) -> Option<SessionProgress> {
        // Hold the lock across the save. Cancel needs the same lock, so it
        // can never land between the record write and the state change.
        let mut inner = self.inner.lock().await;
        if inner.session_id != session_id || inner.state != SessionState::Running {
            return None;
        }

        let record = VideoRecord {
            id: VideoId::generate(),
            title: derive_title(script),
            script: script.to_string(),
            duration_secs: settings.duration_secs,
            created_at_unix_ms: unix_ms_now(),
            voice: settings.voice.clone(),
            style: settings.style.clone(),
            template: settings.template.clone(),
            resolution: settings.resolution,
            thumbnail: thumbnail_for_style(&settings.style),
            video_url,
        };

        if let Err(e) = self.sink.insert(record).await {
            log::error!("failed to save generated video: {e:#}");
            let message = format!("could not save the generated video: {e}");
            return Some(Self::fail_locked(&mut inner, elapsed, message));
        }

        let prev = inner.state;
        inner.state = SessionState::Completed;
        inner.percent = 100;
        inner.stage_index = self.cfg.plan.stages().len() - 1;
        inner.stage_label = self.cfg.plan.stages().last().map(|s| s.label);
        inner.elapsed_ms = ms(elapsed);
        inner.remaining_ms = 0;
        inner.error = None;
        log::info!("session state: {:?} -> {:?}", prev, SessionState::Completed);
        Some(Self::payload(&inner))
    }

    async fn finish_failed(
        &self,
        session_id: u64,
        elapsed: Duration,
        message: String,
    ) -> Option<SessionProgress> {
        let mut inner = self.inner.lock().await;
        if inner.session_id != session_id || inner.state != SessionState::Running {
            return None;
        }
        Some(Self::fail_locked(&mut inner, elapsed, message))
    }

    fn fail_locked(inner: &mut Inner, elapsed: Duration, message: String) -> SessionProgress {
        log::error!("session failed: {message}");
        let prev = inner.state;
        inner.state = SessionState::Failed;
        inner.elapsed_ms = ms(elapsed);
        inner.error = Some(message);
        log::info!("session state: {:?} -> {:?}", prev, SessionState::Failed);
        Self::payload(inner)
    }

    fn payload(inner: &Inner) -> SessionProgress {
        SessionProgress {
            state: inner.state,
            state_label: state_label(inner.state).into(),
            percent: inner.percent,
            stage_index: inner.stage_index,
            stage_label: inner.stage_label.map(|s| s.to_string()),
            elapsed_ms: inner.elapsed_ms,
            remaining_ms: inner.remaining_ms,
            error: inner.error.clone(),
        }
    }
}

fn unix_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
