//! Lifecycle Reporter — инициализация PCB и финальная статистика
//! Lifecycle Reporter — PCB setup at creation, final record at exit

use core::fmt;
use log::info;

use crate::config::SchedConfig;
use crate::task::{LevelBudget, Pid, Task};
use crate::time::Millis;

/// Заполнить поля новой задачи / Initialise a freshly allocated PCB.
pub fn on_create(task: &mut Task, now: Millis, cfg: &SchedConfig) {
    task.create_time = now;
    task.first_scheduled = None;
    task.finish_time = None;
    task.cpu_time_ms = 0;
    task.last_run_start = None;
    task.timer_interrupts = 0;
    task.mlfq_level = 0;
    task.budget = LevelBudget::Remaining(cfg.quota(0));
    task.set_runnable(true);
}

/// Final statistics of a terminated task. Emitted once, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStats {
    pub pid:              Pid,
    pub turnaround_ms:    u64,
    /// `None` — ни разу не запускалась / never dispatched
    pub response_ms:      Option<u64>,
    pub cpu_time_ms:      u64,
    pub timer_interrupts: u64,
}

impl fmt::Display for ExitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process {} exiting: turnaround={} ms, ", self.pid, self.turnaround_ms)?;
        match self.response_ms {
            Some(ms) => write!(f, "response={} ms, ", ms)?,
            None     => write!(f, "response=0 ms (never scheduled), ")?,
        }
        write!(f, "cpu_time={} ms, timer_interrupts={}", self.cpu_time_ms, self.timer_interrupts)
    }
}

/// Снять финальную статистику и заморозить PCB.
/// Take the final record and freeze the PCB.
///
/// A second call on the same task returns the same record and does not
/// move `finish_time`.
pub fn on_terminate(task: &mut Task, now: Millis) -> ExitStats {
    let finish = *task.finish_time.get_or_insert(now);
    let newly_exited = !task.is_exited();
    task.mark_exited();
    task.last_run_start = None;

    let stats = ExitStats {
        pid:              task.pid(),
        turnaround_ms:    finish.saturating_since(task.create_time),
        response_ms:      task.response_ms(),
        cpu_time_ms:      task.cpu_time_ms,
        timer_interrupts: task.timer_interrupts,
    };

    if newly_exited {
        info!("{}", stats);
    }
    stats
}
