//! Process Control Block — поля планирования и статистики
//! Process Control Block — scheduling and lifecycle fields

use bitflags::bitflags;
use core::fmt;

use crate::config::MAX_LEVEL;
use crate::time::Millis;

/// Идентификатор процесса / Process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Флаги задачи / Task flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaskFlags: u32 {
        /// Может быть выбрана диспетчером / Eligible for selection
        const RUNNABLE    = 1 << 0;
        /// Консоль/shell — получает буст при вводе / Boosted on console input
        const INTERACTIVE = 1 << 1;
        /// Финальная статистика уже снята / Final record already taken
        const EXITED      = 1 << 2;
    }
}

/// Time left on the current level before demotion.
///
/// `Remaining(0)` is an exhausted budget and is never confused with `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBudget {
    /// Не инициализирован для текущего уровня / Not initialised for this level
    Unset,
    Remaining(u64),
    /// Только на MAX_LEVEL / Only at MAX_LEVEL
    Unbounded,
}

impl LevelBudget {
    pub const fn is_exhausted(self) -> bool {
        matches!(self, LevelBudget::Remaining(0))
    }

    /// Списать `ms`, не уходя ниже нуля / Charge `ms`, floored at zero.
    pub const fn charge(self, ms: u64) -> LevelBudget {
        match self {
            LevelBudget::Remaining(left) => LevelBudget::Remaining(left.saturating_sub(ms)),
            other => other,
        }
    }
}

impl fmt::Display for LevelBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelBudget::Unset        => write!(f, "unset"),
            LevelBudget::Remaining(m) => write!(f, "{}ms", m),
            LevelBudget::Unbounded    => write!(f, "unbounded"),
        }
    }
}

/// Process Control Block.
///
/// Only the accounting, level and dispatch paths write the scheduling
/// fields; everything else sees them through the getters.
#[derive(Debug, Clone)]
pub struct Task {
    pid:   Pid,
    flags: TaskFlags,

    // ── MLFQ ─────────────────────────────────────────────────────────────────
    pub(crate) mlfq_level: u8,
    pub(crate) budget:     LevelBudget,

    // ── Lifecycle statistics ─────────────────────────────────────────────────
    pub(crate) create_time:      Millis,
    pub(crate) first_scheduled:  Option<Millis>,
    pub(crate) finish_time:      Option<Millis>,
    pub(crate) cpu_time_ms:      u64,
    pub(crate) last_run_start:   Option<Millis>,
    pub(crate) timer_interrupts: u64,
}

impl Task {
    /// Пустой PCB — поля заполняет `lifecycle::on_create`.
    /// Blank PCB; `lifecycle::on_create` fills the fields in.
    pub const fn new(pid: Pid, flags: TaskFlags) -> Self {
        Self {
            pid,
            flags,
            mlfq_level:       0,
            budget:           LevelBudget::Unset,
            create_time:      Millis::ZERO,
            first_scheduled:  None,
            finish_time:      None,
            cpu_time_ms:      0,
            last_run_start:   None,
            timer_interrupts: 0,
        }
    }

    pub const fn pid(&self) -> Pid             { self.pid }
    pub const fn flags(&self) -> TaskFlags     { self.flags }
    pub const fn level(&self) -> u8            { self.mlfq_level }
    pub const fn budget(&self) -> LevelBudget  { self.budget }
    pub const fn cpu_time_ms(&self) -> u64     { self.cpu_time_ms }
    pub const fn timer_interrupts(&self) -> u64 { self.timer_interrupts }
    pub const fn create_time(&self) -> Millis  { self.create_time }
    pub const fn first_scheduled(&self) -> Option<Millis> { self.first_scheduled }
    pub const fn finish_time(&self) -> Option<Millis>     { self.finish_time }
    pub const fn last_run_start(&self) -> Option<Millis>  { self.last_run_start }

    pub fn is_runnable(&self) -> bool {
        self.flags.contains(TaskFlags::RUNNABLE) && !self.flags.contains(TaskFlags::EXITED)
    }

    pub fn set_runnable(&mut self, runnable: bool) {
        self.flags.set(TaskFlags::RUNNABLE, runnable);
    }

    pub fn is_interactive(&self) -> bool {
        self.flags.contains(TaskFlags::INTERACTIVE)
    }

    pub fn is_exited(&self) -> bool {
        self.flags.contains(TaskFlags::EXITED)
    }

    pub(crate) fn mark_exited(&mut self) {
        self.flags.remove(TaskFlags::RUNNABLE);
        self.flags.insert(TaskFlags::EXITED);
    }

    pub const fn at_max_level(&self) -> bool {
        self.mlfq_level >= MAX_LEVEL
    }

    /// Response time so far; `None` until the first dispatch.
    pub fn response_ms(&self) -> Option<u64> {
        self.first_scheduled
            .filter(|first| *first >= self.create_time)
            .map(|first| first.saturating_since(self.create_time))
    }

    pub fn snapshot(&self) -> TaskStats {
        TaskStats {
            pid:              self.pid,
            level:            self.mlfq_level,
            budget:           self.budget,
            runnable:         self.is_runnable(),
            cpu_time_ms:      self.cpu_time_ms,
            timer_interrupts: self.timer_interrupts,
            response_ms:      self.response_ms(),
        }
    }
}

/// Живая статистика задачи / Live statistics of a task still in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub pid:              Pid,
    pub level:            u8,
    pub budget:           LevelBudget,
    pub runnable:         bool,
    pub cpu_time_ms:      u64,
    pub timer_interrupts: u64,
    pub response_ms:      Option<u64>,
}

impl fmt::Display for TaskStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid {:>3} level={} budget={} runnable={} cpu_time={} ms ticks={}",
            self.pid.0, self.level, self.budget, self.runnable,
            self.cpu_time_ms, self.timer_interrupts,
        )?;
        match self.response_ms {
            Some(ms) => write!(f, " response={} ms", ms),
            None     => write!(f, " response=-"),
        }
    }
}
