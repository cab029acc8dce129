use crate::request::{Body, HttpRequest};
use reelgen_core::settings::EffectiveSettings;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoGenConfig {
    pub base_url: String,
    pub api_key: String,
}

pub fn build_generate_request(
    cfg: &VideoGenConfig,
    script: &str,
    settings: &EffectiveSettings,
) -> HttpRequest {
    let url = join_url(&cfg.base_url, "/v1/videos/generate");

    let payload = json!({
        "prompt": script,
        "duration": settings.duration_secs,
        "voice": settings.voice.as_str(),
        "style": settings.style.as_str(),
        "template": settings.template.as_str(),
        "background_music": settings.background_music,
        "resolution": settings.resolution.as_str(),
        "frame_rate": settings.frame_rate,
        "transition": settings.transition.as_str(),
        "voice_speed": settings.voice_speed,
        "music_volume": settings.music_volume,
    });

    HttpRequest {
        method: "POST".into(),
        url,
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        ],
        body: Body::Json(payload.to_string()),
    }
}

pub fn build_status_request(cfg: &VideoGenConfig, job_id: &str) -> HttpRequest {
    let url = join_url(&cfg.base_url, &format!("/v1/videos/{job_id}"));

    HttpRequest {
        method: "GET".into(),
        url,
        headers: vec![("Authorization".into(), format!("Bearer {}", cfg.api_key))],
        body: Body::Empty,
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
