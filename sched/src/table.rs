//! Таблица процессов — арена PCB фиксированного размера
//! Process table — fixed-size PCB arena
//!
//! Слоты могут быть пустыми (дыры после exit). Порядок обхода — порядок
//! слотов; именно он разрешает ничьи внутри уровня.
//! Slots may be empty (gaps after exit). Iteration follows slot order,
//! which is what breaks ties inside a level.

use crate::config::MAX_TASKS;
use crate::task::{Pid, Task};
use crate::{Error, Result};

/// Индекс слота / Stable slot index, valid until the task is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub(crate) usize);

impl TaskHandle {
    pub const fn index(self) -> usize { self.0 }
}

pub struct ProcessTable {
    slots: [Option<Task>; MAX_TASKS],
    len:   usize,
}

impl ProcessTable {
    pub const fn new() -> Self {
        const EMPTY: Option<Task> = None;
        Self { slots: [EMPTY; MAX_TASKS], len: 0 }
    }

    pub const fn len(&self) -> usize       { self.len }
    pub const fn is_empty(&self) -> bool   { self.len == 0 }
    pub const fn capacity(&self) -> usize  { MAX_TASKS }

    /// Занять первый свободный слот / Take the first free slot.
    pub fn insert(&mut self, task: Task) -> Result<TaskHandle> {
        let idx = self.slots.iter().position(Option::is_none).ok_or(Error::TableFull)?;
        self.slots[idx] = Some(task);
        self.len += 1;
        Ok(TaskHandle(idx))
    }

    pub fn remove(&mut self, handle: TaskHandle) -> Option<Task> {
        let task = self.slots.get_mut(handle.0)?.take()?;
        self.len -= 1;
        Some(task)
    }

    pub fn get(&self, handle: TaskHandle) -> Option<&Task> {
        self.slots.get(handle.0)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: TaskHandle) -> Option<&mut Task> {
        self.slots.get_mut(handle.0)?.as_mut()
    }

    pub fn find(&self, pid: Pid) -> Option<TaskHandle> {
        self.iter().find(|(_, t)| t.pid() == pid).map(|(h, _)| h)
    }

    /// Обход в порядке слотов, пустые пропускаются.
    /// Slot-order walk, empty slots skipped.
    pub fn iter(&self) -> impl Iterator<Item = (TaskHandle, &Task)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (TaskHandle(i), t)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> + '_ {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
