use reelgen_core::settings::EffectiveSettings;
use reelgen_engine::traits::{JobId, ProviderStatus, SubmitAck};
use reelgen_providers::parse::JobPhase;

#[derive(Clone)]
pub struct HttpSynthesisProvider {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpSynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSynthesisProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpSynthesisProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn config(&self) -> reelgen_providers::videogen::VideoGenConfig {
        reelgen_providers::videogen::VideoGenConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl reelgen_engine::traits::SynthesisProvider for HttpSynthesisProvider {
    async fn submit(
        &self,
        script: &str,
        settings: &EffectiveSettings,
    ) -> anyhow::Result<SubmitAck> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("missing video provider API key"));
        }

        let req =
            reelgen_providers::videogen::build_generate_request(&self.config(), script, settings);
        let resp = reelgen_providers::runtime::execute(&req).await?;
        if !(200..=299).contains(&resp.status) {
            return Err(anyhow::anyhow!(
                "video generation failed: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ));
        }

        let ack = reelgen_providers::parse::parse_generate_response(&resp.body)?;
        Ok(SubmitAck {
            job_id: ack.job_id.map(JobId::new),
            video_url: ack.video_url,
        })
    }

    async fn poll(&self, job: &JobId) -> anyhow::Result<ProviderStatus> {
        let req = reelgen_providers::videogen::build_status_request(&self.config(), job.as_str());
        let resp = reelgen_providers::runtime::execute(&req).await?;
        if !(200..=299).contains(&resp.status) {
            return Err(anyhow::anyhow!(
                "video status check failed: status={} body={}",
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ));
        }

        let status = reelgen_providers::parse::parse_status_response(&resp.body)?;
        Ok(match status.phase {
            JobPhase::Queued => ProviderStatus::Queued,
            JobPhase::Running => ProviderStatus::Running,
            JobPhase::Succeeded => match status.video_url {
                Some(video_url) => ProviderStatus::Succeeded { video_url },
                None => {
                    return Err(anyhow::anyhow!(
                        "provider reported success without a video url"
                    ));
                }
            },
            JobPhase::Failed => ProviderStatus::Failed {
                message: status
                    .message
                    .unwrap_or_else(|| "video generation failed".into()),
            },
            JobPhase::Canceled => ProviderStatus::Failed {
                message: "canceled by provider".into(),
            },
        })
    }
}
