use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use reelgen_core::script::validate_script;
use reelgen_core::settings::{
    GenerationDefaults, GenerationOverrides, resolve_effective_settings, validate_settings,
};
use reelgen_core::types::{Resolution, StyleId, TemplateId, Transition, VoiceId};
use reelgen_providers::parse::{JobPhase, parse_generate_response, parse_status_response};
use reelgen_providers::runtime::execute;
use reelgen_providers::videogen::{build_generate_request, build_status_request};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body of `POST /generate-video`. Field names follow the browser
/// client (camelCase); everything except the script is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    script: Option<String>,
    duration: Option<u32>,
    voice: Option<String>,
    style: Option<String>,
    template: Option<String>,
    background_music: Option<bool>,
    resolution: Option<Resolution>,
    frame_rate: Option<u32>,
    transition: Option<Transition>,
    voice_speed: Option<f32>,
    music_volume: Option<f32>,
}

impl GenerateBody {
    fn overrides(&self) -> GenerationOverrides {
        GenerationOverrides {
            duration_secs: self.duration,
            voice: self.voice.clone().map(VoiceId::new),
            style: self.style.clone().map(StyleId::new),
            template: self.template.clone().map(TemplateId::new),
            background_music: self.background_music,
            resolution: self.resolution,
            frame_rate: self.frame_rate,
            transition: self.transition,
            voice_speed: self.voice_speed,
            music_volume: self.music_volume,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReply {
    video_url: String,
}

/// `POST /generate-video`: validate, forward to the provider, relay the URL.
async fn generate_video(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<Json<GenerateReply>> {
    let script = body.script.as_deref().map(str::trim).unwrap_or_default();
    if script.is_empty() {
        return Err(ApiError::MissingScript);
    }
    validate_script(script).map_err(|e| ApiError::Validation(e.to_string()))?;

    let settings = resolve_effective_settings(&GenerationDefaults::default(), &body.overrides());
    validate_settings(&settings).map_err(|e| ApiError::Validation(e.to_string()))?;

    let req = build_generate_request(&state.videogen_config(), script, &settings);
    let resp = execute(&req)
        .await
        .map_err(|e| ApiError::ProviderFailure(format!("{e:#}")))?;
    if !(200..=299).contains(&resp.status) {
        return Err(ApiError::ProviderFailure(format!(
            "status={} body={}",
            resp.status,
            String::from_utf8_lossy(&resp.body)
        )));
    }

    let ack = parse_generate_response(&resp.body)
        .map_err(|e| ApiError::ProviderFailure(format!("{e:#}")))?;
    match ack.video_url {
        Some(video_url) => Ok(Json(GenerateReply { video_url })),
        None => Err(ApiError::ProviderNoOutput),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReply {
    job_id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
}

/// `GET /generate-video/{job_id}/status`: relay the provider's job status.
async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusReply>> {
    let req = build_status_request(&state.videogen_config(), &job_id);
    let resp = execute(&req)
        .await
        .map_err(|e| ApiError::ProviderFailure(format!("{e:#}")))?;
    if !(200..=299).contains(&resp.status) {
        return Err(ApiError::ProviderFailure(format!(
            "status={} body={}",
            resp.status,
            String::from_utf8_lossy(&resp.body)
        )));
    }

    let status = parse_status_response(&resp.body)
        .map_err(|e| ApiError::ProviderFailure(format!("{e:#}")))?;
    let label = match status.phase {
        JobPhase::Queued => "queued",
        JobPhase::Running => "processing",
        JobPhase::Succeeded => "completed",
        JobPhase::Failed => "failed",
        JobPhase::Canceled => "canceled",
    };

    Ok(Json(StatusReply {
        job_id,
        status: label,
        video_url: status.video_url,
    }))
}

/// Routes mounted at the root.
///
/// ```text
/// POST   /generate-video                   -> generate_video
/// GET    /generate-video/{job_id}/status   -> job_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-video", post(generate_video))
        .route("/generate-video/{job_id}/status", get(job_status))
}
