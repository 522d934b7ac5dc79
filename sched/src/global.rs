//! Глобальный планировщик ядра / The kernel-wide scheduler instance
//!
//! Точки входа для ядра / Kernel entry points:
//!   init()      — при загрузке / at boot
//!   spawn/exit  — создание и завершение процессов / process create, exit
//!   tick()      — из IRQ таймера / from the timer IRQ
//!   yield_now() — task_yield() и вытеснение / yield and preemption
//!
//! tick() никогда не ждёт блокировку: занятый лок откладывает тик.
//! tick() never waits for the lock: a held lock defers the tick.

use core::sync::atomic::{AtomicU64, Ordering};
use spin::Mutex;

use crate::config::SchedConfig;
use crate::lifecycle::ExitStats;
use crate::platform::Platform;
use crate::scheduler::{Decision, Scheduler};
use crate::task::{Pid, TaskFlags, TaskStats};
use crate::time::Millis;
use crate::Result;

static SCHEDULER: Mutex<Scheduler> = Mutex::new(Scheduler::new(SchedConfig::new()));

/// Тики, пришедшие под занятой блокировкой / Ticks that hit a held lock
static DEFERRED_TICKS: AtomicU64 = AtomicU64::new(0);

/// Сбросить планировщик с новой конфигурацией.
/// Reset the scheduler with a new configuration; drops every task.
pub fn init(config: SchedConfig) {
    *SCHEDULER.lock() = Scheduler::new(config);
    log::info!(
        "[sched] MLFQ ready: quota step {}ms, reset every {}ms",
        config.quota_step_ms, config.reset_interval_ms,
    );
}

pub fn spawn(now: Millis, flags: TaskFlags) -> Result<Pid> {
    SCHEDULER.lock().spawn(now, flags)
}

pub fn exit(pid: Pid, now: Millis) -> Result<ExitStats> {
    SCHEDULER.lock().exit(pid, now)
}

pub fn set_runnable(pid: Pid, runnable: bool) -> Result<()> {
    SCHEDULER.lock().set_runnable(pid, runnable)
}

pub fn stats(pid: Pid) -> Option<TaskStats> {
    SCHEDULER.lock().stats(pid)
}

/// Тик таймера / Timer tick.
///
/// Never spins: if the IRQ lands while kernel code holds the lock, the tick
/// is only counted and replayed by the next tick that gets the lock. The
/// elapsed CPU time is not lost, the next tick charges it in full.
pub fn tick(now: Millis) {
    let Some(mut sched) = SCHEDULER.try_lock() else {
        DEFERRED_TICKS.fetch_add(1, Ordering::Relaxed);
        return;
    };

    sched.timer_tick(now);
    let missed = DEFERRED_TICKS.swap(0, Ordering::Relaxed);
    for _ in 0..missed {
        // Повтор с тем же `now`: +1 прерывание, 0 мс / Same `now`: counts, adds no time
        sched.timer_tick(now);
    }
}

/// Выбрать задачу и переключиться на неё.
/// Pick a task and switch to it.
///
/// The lock is released before `switch_to`, so the timer IRQ can account
/// the chosen task while it runs.
pub fn yield_now<P: Platform>(platform: &mut P) -> Decision {
    let now = platform.now_ms();
    let input = platform.has_pending_interactive_input();
    let decision = SCHEDULER.lock().schedule(now, input, |event| platform.notify(&event));

    match decision {
        Decision::Run(pid) => platform.switch_to(pid),
        Decision::Idle     => platform.idle(),
    }
    decision
}

/// Доступ к состоянию под блокировкой / Run `f` with the scheduler locked.
pub fn with<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    f(&mut SCHEDULER.lock())
}
