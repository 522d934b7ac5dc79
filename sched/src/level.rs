//! Level Manager — квоты, понижение и сброс уровней
//! Level Manager — quotas, demotion and level resets

use log::{debug, info};

use crate::config::{SchedConfig, MAX_LEVEL};
use crate::platform::SchedEvent;
use crate::table::ProcessTable;
use crate::task::{LevelBudget, Task};

/// quota(level) = (level + 1) * 100 ms — квота при шаге по умолчанию.
/// Quota with the default step; a tuned scheduler uses [`SchedConfig::quota`].
pub const fn quota(level: u8) -> u64 {
    SchedConfig::new().quota(level)
}

/// Проверить квоту и понизить задачу при её исчерпании.
/// Check the budget and demote the task once it is exhausted.
///
/// Returns the demotion event, if any. A task reaching `MAX_LEVEL` is
/// terminal: its budget becomes `Unbounded` and it stays there until reset.
pub fn update_level(task: &mut Task, cfg: &SchedConfig) -> Option<SchedEvent> {
    if task.at_max_level() {
        task.budget = LevelBudget::Unbounded;
        return None;
    }

    if matches!(task.budget, LevelBudget::Unset | LevelBudget::Unbounded) {
        task.budget = LevelBudget::Remaining(cfg.quota(task.mlfq_level));
    }

    if !task.budget.is_exhausted() {
        return None;
    }

    task.mlfq_level = (task.mlfq_level + 1).min(MAX_LEVEL);
    task.budget = LevelBudget::Remaining(cfg.quota(task.mlfq_level));
    info!("[mlfq] pid {} demoted to level {}", task.pid(), task.mlfq_level);

    Some(SchedEvent::Demoted { pid: task.pid(), level: task.mlfq_level })
}

/// Вернуть задачу на уровень 0 с полной квотой.
/// Put the task back on level 0 with a full quota.
pub fn reset_level(task: &mut Task, cfg: &SchedConfig) {
    task.mlfq_level = 0;
    task.budget = LevelBudget::Remaining(cfg.quota(0));
}

/// Starvation avoidance: every task back to level 0.
pub fn reset_level_all(table: &mut ProcessTable, cfg: &SchedConfig) {
    for task in table.iter_mut() {
        reset_level(task, cfg);
    }
    debug!("[mlfq] all {} tasks reset to level 0", table.len());
}
