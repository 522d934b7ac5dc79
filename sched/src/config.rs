//! Константы и конфигурация планировщика / Scheduler constants and configuration

/// Количество уровней MLFQ / Number of MLFQ levels
pub const MLFQ_LEVELS: usize = 5;

/// Самый низкий приоритет — без понижения / Lowest priority, never demoted
pub const MAX_LEVEL: u8 = (MLFQ_LEVELS - 1) as u8;

/// Шаг квоты: quota(level) = (level + 1) * QUOTA_STEP_MS
pub const QUOTA_STEP_MS: u64 = 100;

/// Период сброса всех уровней в 0 / Starvation-avoidance reset period
pub const RESET_INTERVAL_MS: u64 = 10_000;

/// Размер таблицы процессов / Process table capacity
pub const MAX_TASKS: usize = 64;

/// Tunables of one scheduler instance.
///
/// The level count is fixed at [`MLFQ_LEVELS`]; only the timing knobs move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Quota of level 0, each next level gets one more step.
    pub quota_step_ms: u64,
    /// Wall-clock time between two periodic level resets.
    pub reset_interval_ms: u64,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self {
            quota_step_ms:     QUOTA_STEP_MS,
            reset_interval_ms: RESET_INTERVAL_MS,
        }
    }

    /// Квота уровня / Time quota of `level`, saturating on absurd steps.
    pub const fn quota(&self, level: u8) -> u64 {
        (level as u64 + 1).saturating_mul(self.quota_step_ms)
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}
