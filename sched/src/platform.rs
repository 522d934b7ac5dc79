//! Внешние примитивы ядра / Kernel primitives the scheduler consumes
//!
//! Переключение контекста, часы, ввод с клавиатуры и idle реализует
//! окружающее ядро (или симулятор на хосте).
//! Context switch, clock, keyboard input and idle belong to the
//! surrounding kernel (or the host simulator).

use crate::task::Pid;
use crate::time::Millis;

/// Событие для наблюдаемости / Observability event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedEvent {
    /// Квота исчерпана / Quota used up, task moved down
    Demoted { pid: Pid, level: u8 },
    /// Интерактивная задача поднята на уровень 0 / Interactive boost
    Boosted { pid: Pid },
    /// Периодический сброс / Periodic starvation-avoidance reset
    LevelsReset { at: Millis },
}

pub trait Platform {
    /// Мс с загрузки / Milliseconds since boot, monotonic-intended.
    fn now_ms(&self) -> Millis;

    /// Передать CPU задаче. Возвращается, когда она уступит CPU.
    /// Hand the CPU to `pid`; returns once it yields or is preempted.
    ///
    /// A failing switch is a kernel panic; there is no error path back.
    fn switch_to(&mut self, pid: Pid);

    /// Есть ли ввод для интерактивной задачи / Console input pending?
    fn has_pending_interactive_input(&mut self) -> bool;

    /// Нет готовых задач / Nothing runnable.
    fn idle(&mut self);

    /// Never fatal; the default drops the event.
    fn notify(&mut self, _event: &SchedEvent) {}
}
