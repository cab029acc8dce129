use anyhow::{Context, anyhow};
use serde::Deserialize;

/// What the provider tells us right after a generation is submitted. Some
/// deployments answer with a finished video url, others with a job id to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAck {
    pub video_url: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    video_url: Option<String>,
    output_url: Option<String>,
    id: Option<String>,
}

pub fn parse_generate_response(body: &[u8]) -> anyhow::Result<GenerationAck> {
    let resp: GenerateResponse = serde_json::from_slice(body).context("decode generate JSON")?;
    Ok(GenerationAck {
        video_url: resp.video_url.or(resp.output_url),
        job_id: resp.id,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub phase: JobPhase,
    pub video_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    video_url: Option<String>,
    output_url: Option<String>,
    error: Option<String>,
}

pub fn parse_status_response(body: &[u8]) -> anyhow::Result<JobStatus> {
    let resp: StatusResponse = serde_json::from_slice(body).context("decode status JSON")?;
    let phase = match resp.status.as_str() {
        "queued" | "starting" | "pending" => JobPhase::Queued,
        "processing" | "running" | "in_progress" => JobPhase::Running,
        "succeeded" | "completed" => JobPhase::Succeeded,
        "failed" | "error" => JobPhase::Failed,
        "canceled" | "cancelled" => JobPhase::Canceled,
        other => return Err(anyhow!("unknown job status: {other}")),
    };
    Ok(JobStatus {
        phase,
        video_url: resp.video_url.or(resp.output_url),
        message: resp.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_video_url() {
        let body = br#"{"video_url":"https://cdn.example.com/v.mp4"}"#;
        let ack = parse_generate_response(body).unwrap();
        assert_eq!(ack.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(ack.job_id, None);
    }

    #[test]
    fn generate_falls_back_to_output_url() {
        let body = br#"{"output_url":"https://cdn.example.com/o.mp4","id":"job-1"}"#;
        let ack = parse_generate_response(body).unwrap();
        assert_eq!(ack.video_url.as_deref(), Some("https://cdn.example.com/o.mp4"));
        assert_eq!(ack.job_id.as_deref(), Some("job-1"));
    }

    #[test]
    fn generate_without_urls_still_parses() {
        let body = br#"{"id":"job-2"}"#;
        let ack = parse_generate_response(body).unwrap();
        assert_eq!(ack.video_url, None);
        assert_eq!(ack.job_id.as_deref(), Some("job-2"));
    }

    #[test]
    fn parses_completed_status() {
        let body = br#"{"status":"completed","video_url":"https://cdn.example.com/v.mp4"}"#;
        let status = parse_status_response(body).unwrap();
        assert_eq!(status.phase, JobPhase::Succeeded);
        assert_eq!(status.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
    }

    #[test]
    fn parses_failed_status_with_message() {
        let body = br#"{"status":"failed","error":"render crashed"}"#;
        let status = parse_status_response(body).unwrap();
        assert_eq!(status.phase, JobPhase::Failed);
        assert_eq!(status.message.as_deref(), Some("render crashed"));
    }

    #[test]
    fn unknown_status_errors() {
        let body = br#"{"status":"transcending"}"#;
        assert!(parse_status_response(body).is_err());
    }
}
