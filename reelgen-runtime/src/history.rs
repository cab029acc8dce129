use crate::fs_util::{ensure_dir, replace_file};
use async_trait::async_trait;
use reelgen_core::config::DEFAULT_HISTORY_CAP;
use reelgen_core::script::thumbnail_for_style;
use reelgen_core::types::{Resolution, StyleId, TemplateId, VideoId, VideoRecord, VoiceId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const HISTORY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid history JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported history version {found} (this build reads version {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

// On-disk envelope. The version gate means an older build refuses a newer
// file instead of silently mangling it.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: Vec<VideoRecord>,
}

/// How a store came up when opened leniently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No file on disk yet. A cleared store does not report this.
    FirstRun,
    Loaded,
    /// The file was unreadable and the store started over empty.
    Recovered { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Case-insensitive substring over title, script and style.
    pub text: Option<String>,
    /// Exact match on the recorded duration.
    pub duration_secs: Option<u32>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &VideoRecord) -> bool {
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() {
                let hit = record.title.to_lowercase().contains(&needle)
                    || record.script.to_lowercase().contains(&needle)
                    || record.style.as_str().to_lowercase().contains(&needle);
                if !hit {
                    return false;
                }
            }
        }

        if let Some(duration) = self.duration_secs {
            if record.duration_secs != duration {
                return false;
            }
        }

        true
    }
}

/// Newest-first list of generated videos, persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    cap: usize,
}

impl HistoryStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cap: DEFAULT_HISTORY_CAP,
        }
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Strict load: a missing file is an empty history, anything else
    /// unreadable is an error.
    pub fn load(&self) -> Result<Vec<VideoRecord>, HistoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let file: HistoryFile =
                    serde_json::from_slice(&bytes).map_err(|source| HistoryError::Parse {
                        path: self.path.clone(),
                        source,
                    })?;
                if file.version != HISTORY_SCHEMA_VERSION {
                    return Err(HistoryError::UnsupportedVersion {
                        found: file.version,
                        expected: HISTORY_SCHEMA_VERSION,
                    });
                }
                Ok(file.records)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
            Err(source) => Err(HistoryError::Io {
                action: "read",
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Lenient startup load. Distinguishes a true first run from an existing
    /// (possibly damaged) store so callers can decide whether to seed.
    pub fn load_or_recover(&self) -> (Vec<VideoRecord>, RecoveryOutcome) {
        if !self.path.exists() {
            return (vec![], RecoveryOutcome::FirstRun);
        }

        match self.load() {
            Ok(records) => (records, RecoveryOutcome::Loaded),
            Err(e) => {
                log::warn!("history unreadable, starting empty: {e}");
                (
                    vec![],
                    RecoveryOutcome::Recovered {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Prepends the record (newest first) and evicts the oldest past the cap.
    pub fn insert(&self, record: VideoRecord) -> Result<(), HistoryError> {
        let mut records = self.load()?;
        records.insert(0, record);
        records.truncate(self.cap);
        self.persist(&records)
    }

    pub fn list(&self, filter: &HistoryFilter) -> Result<Vec<VideoRecord>, HistoryError> {
        let records = self.load()?;
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// Removes the record if present. Deleting an unknown id is not an error;
    /// the boolean says whether anything changed.
    pub fn delete(&self, id: &VideoId) -> Result<bool, HistoryError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Ok(false);
        }

        self.persist(&records)?;
        Ok(true)
    }

    /// Empties the list but keeps the file, so a cleared store is not
    /// mistaken for a first run later.
    pub fn clear(&self) -> Result<(), HistoryError> {
        self.persist(&[])
    }

    pub fn persist(&self, records: &[VideoRecord]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).map_err(|source| HistoryError::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = HistoryFile {
            version: HISTORY_SCHEMA_VERSION,
            records: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| HistoryError::Io {
            action: "write",
            path: tmp.clone(),
            source,
        })?;
        replace_file(&tmp, &self.path).map_err(|source| HistoryError::Io {
            action: "replace",
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[async_trait]
impl reelgen_engine::traits::RecordSink for HistoryStore {
    async fn insert(&self, record: VideoRecord) -> anyhow::Result<()> {
        HistoryStore::insert(self, record)?;
        Ok(())
    }
}

/// The three showcase records a fresh install starts with.
pub fn seed_records() -> Vec<VideoRecord> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;

    let seeds: [(&str, &str, u32, &str); 3] = [
        (
            "Product Demo Video",
            "Introducing our new platform. This quick tour walks through the dashboard, \
             reporting and the integrations your team already uses every day.",
            45,
            "default",
        ),
        (
            "Training Module",
            "Welcome to onboarding. This module covers workplace safety basics, who to \
             contact in an emergency and where to find the full handbook.",
            120,
            "training",
        ),
        (
            "Marketing Clip",
            "Big news: our summer sale starts Friday. Three days only, with the deepest \
             discounts of the year across every product line.",
            30,
            "marketing",
        ),
    ];

    seeds
        .into_iter()
        .enumerate()
        .map(|(i, (title, script, duration_secs, style))| {
            let style = StyleId::new(style);
            VideoRecord {
                id: VideoId::generate(),
                title: title.to_string(),
                script: script.to_string(),
                duration_secs,
                // Stagger timestamps a minute apart so the list reads newest first.
                created_at_unix_ms: now - (i as i64) * 60_000,
                voice: VoiceId::new("default"),
                style: style.clone(),
                template: TemplateId::new("default"),
                resolution: Resolution::Hd720,
                thumbnail: thumbnail_for_style(&style),
                video_url: None,
            }
        })
        .collect()
}
