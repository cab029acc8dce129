use std::time::Duration;

pub const STAGE_ANALYZING: &str = "analyzing script";
pub const STAGE_AUDIO: &str = "generating audio";
pub const STAGE_RENDERING: &str = "rendering video";
pub const STAGE_FINALIZING: &str = "finalizing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub label: &'static str,
    pub nominal: Duration,
}

impl Stage {
    pub const fn new(label: &'static str, nominal: Duration) -> Self {
        Self { label, nominal }
    }
}

/// Snapshot of where a session stands at a given elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPoint {
    pub percent: u8,
    pub stage_index: usize,
    pub stage_label: &'static str,
    pub remaining: Duration,
}

/// Ordered list of presentation stages with nominal durations.
///
/// Progress is a pure function of elapsed time against this plan, so the
/// same elapsed value always maps to the same percent and stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<Stage>,
    total: Duration,
}

impl StagePlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        assert!(!stages.is_empty(), "stage plan requires at least one stage");
        let total = stages.iter().map(|s| s.nominal).sum();
        Self { stages, total }
    }

    /// The four stages a generation walks through, with the nominal pacing
    /// shown to users while the real work happens elsewhere.
    pub fn standard() -> Self {
        Self::new(vec![
            Stage::new(STAGE_ANALYZING, Duration::from_millis(2000)),
            Stage::new(STAGE_AUDIO, Duration::from_millis(3000)),
            Stage::new(STAGE_RENDERING, Duration::from_millis(5000)),
            Stage::new(STAGE_FINALIZING, Duration::from_millis(2000)),
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Maps elapsed time to percent (0-100, clamped) and the current stage.
    ///
    /// Monotone non-decreasing in `elapsed`; past the plan total it pins at
    /// 100 on the last stage.
    pub fn progress_at(&self, elapsed: Duration) -> ProgressPoint {
        let total_ms = self.total.as_millis().max(1);
        let percent = (elapsed.as_millis().saturating_mul(100) / total_ms).min(100) as u8;

        let mut stage_index = self.stages.len() - 1;
        let mut cumulative = Duration::ZERO;
        for (i, stage) in self.stages.iter().enumerate() {
            cumulative += stage.nominal;
            if elapsed < cumulative {
                stage_index = i;
                break;
            }
        }

        ProgressPoint {
            percent,
            stage_index,
            stage_label: self.stages[stage_index].label,
            remaining: self.total.saturating_sub(elapsed),
        }
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::standard()
    }
}
