//! Timer Accounting — учёт CPU времени на тике таймера
//! Timer Accounting — CPU time bookkeeping on every timer tick
//!
//! Вызывается из обработчика IRQ таймера: не блокирует, не аллоцирует,
//! трогает только PCB текущей задачи.
//! Runs in timer IRQ context: never blocks, never allocates, touches only
//! the current task's PCB.

use log::trace;

use crate::task::Task;
use crate::time::Millis;

/// Учесть один тик таймера / Account one timer tick.
///
/// `current` is `None` while the CPU idles; then nothing happens.
pub fn on_timer_tick(current: Option<&mut Task>, now: Millis) {
    let Some(task) = current else { return };

    if let Some(start) = task.last_run_start {
        if now < start {
            trace!("[acct] pid {} clock went back ({} < {})", task.pid(), now, start);
        }
        let elapsed = now.saturating_since(start);
        task.cpu_time_ms = task.cpu_time_ms.saturating_add(elapsed);
        task.budget = task.budget.charge(elapsed);
        task.last_run_start = Some(now);
    }

    task.timer_interrupts = task.timer_interrupts.saturating_add(1);
}
