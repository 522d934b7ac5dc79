//! kestrel-sched — планировщик ядра Kestrel / Kestrel kernel scheduler
//!
//! Multilevel Feedback Queue с периодическим сбросом уровней.
//! Multilevel Feedback Queue with periodic level reset.
//!
//! Уровни / Levels:
//!   0 → 100ms — interactive, fresh tasks   (highest priority)
//!   1 → 200ms
//!   2 → 300ms
//!   3 → 400ms
//!   4 → unbounded — CPU-bound tasks        (lowest priority)
//!
//! Каждые 10 секунд все задачи возвращаются на уровень 0.
//! Every 10 seconds every task goes back to level 0.
//!
//! Использование / Usage:
//!   let mut sched = Scheduler::new(SchedConfig::new());
//!   let pid = sched.spawn(now, TaskFlags::empty())?;
//!   sched.timer_tick(now);              // timer IRQ
//!   sched.reschedule(&mut platform);    // yield / preemption point

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

use core::fmt;

pub mod accounting;
pub mod config;
pub mod global;
pub mod level;
pub mod lifecycle;
pub mod platform;
pub mod scheduler;
pub mod table;
pub mod task;
pub mod time;

pub use config::SchedConfig;
pub use lifecycle::ExitStats;
pub use platform::{Platform, SchedEvent};
pub use scheduler::{Decision, Scheduler};
pub use table::{ProcessTable, TaskHandle};
pub use task::{LevelBudget, Pid, Task, TaskFlags, TaskStats};
pub use time::Millis;

/// Ошибки управления таблицей процессов / Process table errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Все слоты таблицы заняты / Every table slot is taken
    TableFull,
    /// Нет задачи с таким pid / No task with this pid
    NoSuchTask(Pid),
    /// Счётчик pid переполнен / Pid counter overflowed
    PidExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TableFull     => write!(f, "process table is full"),
            Error::NoSuchTask(p) => write!(f, "no task with pid {}", p),
            Error::PidExhausted  => write!(f, "pid space exhausted"),
        }
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
