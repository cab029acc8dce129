use async_trait::async_trait;
use reelgen_core::settings::EffectiveSettings;
use reelgen_core::types::VideoRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a provider answers right after `submit`. Some deployments return a
/// finished video url straight away, others return a job id to poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitAck {
    pub job_id: Option<JobId>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Queued,
    Running,
    Succeeded { video_url: String },
    Failed { message: String },
}

/// Time source for session pacing. The controller never reads the wall clock
/// directly, so tests can run against tokio's paused clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> tokio::time::Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> tokio::time::Instant {
        tokio::time::Instant::now()
    }
}

#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    async fn submit(
        &self,
        script: &str,
        settings: &EffectiveSettings,
    ) -> anyhow::Result<SubmitAck>;

    async fn poll(&self, job: &JobId) -> anyhow::Result<ProviderStatus>;
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert(&self, record: VideoRecord) -> anyhow::Result<()>;
}
