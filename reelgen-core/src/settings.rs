use crate::types::{Resolution, StyleId, TemplateId, Transition, VoiceId};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const DURATION_SECS_RANGE: RangeInclusive<u32> = 10..=300;
pub const VOICE_SPEED_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const MUSIC_VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("duration must be {min}-{max} seconds (got {0})", min = DURATION_SECS_RANGE.start(), max = DURATION_SECS_RANGE.end())]
    DurationOutOfRange(u32),
    #[error("voice speed must be {min}-{max} (got {0})", min = VOICE_SPEED_RANGE.start(), max = VOICE_SPEED_RANGE.end())]
    VoiceSpeedOutOfRange(f32),
    #[error("music volume must be {min}-{max} (got {0})", min = MUSIC_VOLUME_RANGE.start(), max = MUSIC_VOLUME_RANGE.end())]
    MusicVolumeOutOfRange(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    pub duration_secs: u32,
    pub voice: VoiceId,
    pub style: StyleId,
    pub template: TemplateId,
    pub background_music: bool,
    pub resolution: Resolution,
    pub frame_rate: u32,
    pub transition: Transition,
    pub voice_speed: f32,
    pub music_volume: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            voice: VoiceId::new("default"),
            style: StyleId::new("default"),
            template: TemplateId::new("default"),
            background_music: false,
            resolution: Resolution::Hd720,
            frame_rate: 30,
            transition: Transition::Fade,
            voice_speed: 1.0,
            music_volume: 0.5,
        }
    }
}

/// Per-request settings; every field is optional and falls back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerationOverrides {
    pub duration_secs: Option<u32>,
    pub voice: Option<VoiceId>,
    pub style: Option<StyleId>,
    pub template: Option<TemplateId>,
    pub background_music: Option<bool>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<u32>,
    pub transition: Option<Transition>,
    pub voice_speed: Option<f32>,
    pub music_volume: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub duration_secs: u32,
    pub voice: VoiceId,
    pub style: StyleId,
    pub template: TemplateId,
    pub background_music: bool,
    pub resolution: Resolution,
    pub frame_rate: u32,
    pub transition: Transition,
    pub voice_speed: f32,
    pub music_volume: f32,
}

/// One generation request: the script plus any per-request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerationRequest {
    pub script: String,

    #[serde(default)]
    pub overrides: GenerationOverrides,
}

impl GenerationRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            overrides: GenerationOverrides::default(),
        }
    }
}

pub fn resolve_effective_settings(
    defaults: &GenerationDefaults,
    overrides: &GenerationOverrides,
) -> EffectiveSettings {
    let mut settings = EffectiveSettings {
        duration_secs: defaults.duration_secs,
        voice: defaults.voice.clone(),
        style: defaults.style.clone(),
        template: defaults.template.clone(),
        background_music: defaults.background_music,
        resolution: defaults.resolution,
        frame_rate: defaults.frame_rate,
        transition: defaults.transition,
        voice_speed: defaults.voice_speed,
        music_volume: defaults.music_volume,
    };

    apply_overrides(&mut settings, overrides);
    settings
}

fn apply_overrides(settings: &mut EffectiveSettings, overrides: &GenerationOverrides) {
    if let Some(v) = overrides.duration_secs {
        settings.duration_secs = v;
    }
    if let Some(v) = &overrides.voice {
        settings.voice = v.clone();
    }
    if let Some(v) = &overrides.style {
        settings.style = v.clone();
    }
    if let Some(v) = &overrides.template {
        settings.template = v.clone();
    }
    if let Some(v) = overrides.background_music {
        settings.background_music = v;
    }
    if let Some(v) = overrides.resolution {
        settings.resolution = v;
    }
    if let Some(v) = overrides.frame_rate {
        settings.frame_rate = v;
    }
    if let Some(v) = overrides.transition {
        settings.transition = v;
    }
    if let Some(v) = overrides.voice_speed {
        settings.voice_speed = v;
    }
    if let Some(v) = overrides.music_volume {
        settings.music_volume = v;
    }
}

pub fn validate_settings(settings: &EffectiveSettings) -> Result<(), SettingsError> {
    if !DURATION_SECS_RANGE.contains(&settings.duration_secs) {
        return Err(SettingsError::DurationOutOfRange(settings.duration_secs));
    }
    if !VOICE_SPEED_RANGE.contains(&settings.voice_speed) {
        return Err(SettingsError::VoiceSpeedOutOfRange(settings.voice_speed));
    }
    if !MUSIC_VOLUME_RANGE.contains(&settings.music_volume) {
        return Err(SettingsError::MusicVolumeOutOfRange(settings.music_volume));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_defaults_when_no_overrides() {
        let settings =
            resolve_effective_settings(&GenerationDefaults::default(), &GenerationOverrides::default());

        assert_eq!(settings.duration_secs, 60);
        assert_eq!(settings.voice.as_str(), "default");
        assert_eq!(settings.resolution, Resolution::Hd720);
        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.transition, Transition::Fade);
        assert_eq!(settings.voice_speed, 1.0);
        assert_eq!(settings.music_volume, 0.5);
        assert!(!settings.background_music);
    }

    #[test]
    fn resolve_applies_each_override() {
        let overrides = GenerationOverrides {
            duration_secs: Some(30),
            style: Some(StyleId::new("corporate")),
            resolution: Some(Resolution::FullHd1080),
            voice_speed: Some(1.5),
            ..Default::default()
        };

        let settings = resolve_effective_settings(&GenerationDefaults::default(), &overrides);

        assert_eq!(settings.duration_secs, 30);
        assert_eq!(settings.style.as_str(), "corporate");
        assert_eq!(settings.resolution, Resolution::FullHd1080);
        assert_eq!(settings.voice_speed, 1.5);
        // Untouched fields keep the defaults.
        assert_eq!(settings.voice.as_str(), "default");
        assert_eq!(settings.music_volume, 0.5);
    }

    #[test]
    fn validate_rejects_out_of_range_duration() {
        let mut settings =
            resolve_effective_settings(&GenerationDefaults::default(), &GenerationOverrides::default());
        settings.duration_secs = 5;
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::DurationOutOfRange(5))
        );

        settings.duration_secs = 301;
        assert!(validate_settings(&settings).is_err());

        settings.duration_secs = 300;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_sliders() {
        let mut settings =
            resolve_effective_settings(&GenerationDefaults::default(), &GenerationOverrides::default());

        settings.voice_speed = 2.5;
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::VoiceSpeedOutOfRange(_))
        ));

        settings.voice_speed = 1.0;
        settings.music_volume = 1.2;
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::MusicVolumeOutOfRange(_))
        ));
    }
}
