//! Dispatcher — выбор следующей задачи / picks the next task to run
//!
//! Порядок внутри одного вызова фиксирован:
//!   1. периодический сброс уровней     / periodic level reset
//!   2. буст интерактивной задачи       / interactive boost
//!   3. update_level для всех задач     / demotion check for every task
//!   4. выбор: уровень 0..=4, затем порядок слотов / level, then slot order
//!   5. switch_to либо idle

use log::{info, trace};

use crate::accounting;
use crate::config::{SchedConfig, MAX_LEVEL};
use crate::level;
use crate::lifecycle::{self, ExitStats};
use crate::platform::{Platform, SchedEvent};
use crate::table::{ProcessTable, TaskHandle};
use crate::task::{Pid, Task, TaskFlags, TaskStats};
use crate::time::Millis;
use crate::{Error, Result};

/// Решение диспетчера / Dispatch decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run(Pid),
    Idle,
}

/// Всё состояние планировщика / The whole scheduler state.
///
/// `current` is the single mutation point for timer accounting.
pub struct Scheduler {
    table:      ProcessTable,
    current:    Option<TaskHandle>,
    last_reset: Millis,
    next_pid:   u32,
    config:     SchedConfig,
}

impl Scheduler {
    pub const fn new(config: SchedConfig) -> Self {
        Self {
            table:      ProcessTable::new(),
            current:    None,
            last_reset: Millis::ZERO,
            next_pid:   1,
            config,
        }
    }

    pub const fn config(&self) -> &SchedConfig   { &self.config }
    pub const fn table(&self) -> &ProcessTable   { &self.table }
    pub const fn last_reset(&self) -> Millis     { self.last_reset }

    pub fn current_pid(&self) -> Option<Pid> {
        self.current.and_then(|h| self.table.get(h)).map(Task::pid)
    }

    pub fn task(&self, pid: Pid) -> Option<&Task> {
        self.table.find(pid).and_then(|h| self.table.get(h))
    }

    pub fn stats(&self, pid: Pid) -> Option<TaskStats> {
        self.task(pid).map(Task::snapshot)
    }

    fn handle(&self, pid: Pid) -> Result<TaskHandle> {
        self.table.find(pid).ok_or(Error::NoSuchTask(pid))
    }

    fn task_mut(&mut self, pid: Pid) -> Result<&mut Task> {
        let handle = self.handle(pid)?;
        self.table.get_mut(handle).ok_or(Error::NoSuchTask(pid))
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Создать задачу / Create a task; `RUNNABLE` is always set.
    pub fn spawn(&mut self, now: Millis, flags: TaskFlags) -> Result<Pid> {
        let next = self.next_pid.checked_add(1).ok_or(Error::PidExhausted)?;
        let pid = Pid(self.next_pid);

        let mut task = Task::new(pid, flags);
        lifecycle::on_create(&mut task, now, &self.config);
        self.table.insert(task)?;

        self.next_pid = next;
        trace!("[sched] spawned pid {} at {}", pid, now);
        Ok(pid)
    }

    /// Завершить задачу и освободить слот / Terminate and free the slot.
    pub fn exit(&mut self, pid: Pid, now: Millis) -> Result<ExitStats> {
        let handle = self.handle(pid)?;
        let task = self.table.get_mut(handle).ok_or(Error::NoSuchTask(pid))?;
        let stats = lifecycle::on_terminate(task, now);

        self.table.remove(handle);
        if self.current == Some(handle) {
            self.current = None;
        }
        Ok(stats)
    }

    /// Блокировать / разблокировать / Block or unblock a task.
    pub fn set_runnable(&mut self, pid: Pid, runnable: bool) -> Result<()> {
        self.task_mut(pid)?.set_runnable(runnable);
        Ok(())
    }

    /// Boost one task to level 0 outside the dispatch path.
    pub fn boost(&mut self, pid: Pid) -> Result<()> {
        let cfg = self.config;
        level::reset_level(self.task_mut(pid)?, &cfg);
        Ok(())
    }

    // ── Timer IRQ ────────────────────────────────────────────────────────────

    pub fn timer_tick(&mut self, now: Millis) {
        let current = self.current.and_then(|h| self.table.get_mut(h));
        accounting::on_timer_tick(current, now);
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Шаги 1–5 без самого переключения / Steps 1–5 minus the switch itself.
    ///
    /// Every demotion, boost and reset is handed to `sink` in the order it
    /// happened.
    pub fn schedule<F>(&mut self, now: Millis, interactive_input: bool, mut sink: F) -> Decision
    where
        F: FnMut(SchedEvent),
    {
        // 1. Starvation avoidance
        if now.saturating_since(self.last_reset) >= self.config.reset_interval_ms {
            level::reset_level_all(&mut self.table, &self.config);
            self.last_reset = now;
            sink(SchedEvent::LevelsReset { at: now });
        }

        // 2. Interactive boost
        if interactive_input {
            if let Some(task) = self.table.iter_mut().find(|t| t.is_interactive()) {
                level::reset_level(task, &self.config);
                info!("[mlfq] pid {} forced to level 0 due to console input", task.pid());
                sink(SchedEvent::Boosted { pid: task.pid() });
            }
        }

        // 3. Demotion before selection
        for task in self.table.iter_mut() {
            if let Some(event) = level::update_level(task, &self.config) {
                sink(event);
            }
        }

        // 4. Selection
        let Some(winner) = self.select() else {
            self.park_current();
            trace!("[sched] nothing runnable at {}", now);
            return Decision::Idle;
        };

        // 5. Dispatch bookkeeping
        if self.current != Some(winner) {
            self.park_current();
        }
        self.current = Some(winner);

        let Some(task) = self.table.get_mut(winner) else {
            return Decision::Idle;
        };
        // Не раньше создания / Never before creation, even if the clock went back
        task.first_scheduled.get_or_insert(now.max(task.create_time));
        task.last_run_start = Some(now);
        trace!("[sched] run pid {} (level {}) at {}", task.pid(), task.level(), now);
        Decision::Run(task.pid())
    }

    /// Полный цикл: решить и переключиться / Decide, then switch or idle.
    pub fn reschedule<P: Platform>(&mut self, platform: &mut P) -> Decision {
        let now = platform.now_ms();
        let input = platform.has_pending_interactive_input();
        let decision = self.schedule(now, input, |event| platform.notify(&event));

        match decision {
            Decision::Run(pid) => platform.switch_to(pid),
            Decision::Idle     => platform.idle(),
        }
        decision
    }

    /// Первая готовая задача на самом высоком уровне, в порядке слотов.
    /// First runnable task on the highest populated level, in slot order.
    fn select(&self) -> Option<TaskHandle> {
        (0..=MAX_LEVEL).find_map(|lvl| {
            self.table
                .iter()
                .find(|(_, t)| t.is_runnable() && t.level() == lvl)
                .map(|(h, _)| h)
        })
    }

    /// The outgoing task is no longer running.
    fn park_current(&mut self) {
        if let Some(task) = self.current.take().and_then(|h| self.table.get_mut(h)) {
            task.last_run_start = None;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedConfig::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::LevelBudget;
    use proptest::prelude::*;

    fn with_levels(levels: &[u8]) -> (Scheduler, Vec<Pid>) {
        let mut s = Scheduler::default();
        let pids: Vec<Pid> = levels
            .iter()
            .map(|&lvl| {
                let pid = s.spawn(Millis(0), TaskFlags::empty()).unwrap();
                let quota = s.config.quota(lvl);
                let task = s.task_mut(pid).unwrap();
                task.mlfq_level = lvl;
                task.budget = LevelBudget::Remaining(quota);
                pid
            })
            .collect();
        (s, pids)
    }

    fn pick(s: &mut Scheduler, now: u64) -> Decision {
        s.schedule(Millis(now), false, |_| {})
    }

    #[test]
    fn level_then_table_order() {
        let (mut s, p) = with_levels(&[0, 0, 2]);
        assert_eq!(pick(&mut s, 1), Decision::Run(p[0]));

        s.set_runnable(p[0], false).unwrap();
        assert_eq!(pick(&mut s, 2), Decision::Run(p[1]));

        s.set_runnable(p[1], false).unwrap();
        assert_eq!(pick(&mut s, 3), Decision::Run(p[2]));
    }

    #[test]
    fn higher_level_wins_over_table_order() {
        let (mut s, p) = with_levels(&[3, 1, 2]);
        assert_eq!(pick(&mut s, 1), Decision::Run(p[1]));
    }

    #[test]
    fn idle_when_nothing_runnable() {
        let (mut s, p) = with_levels(&[0]);
        s.set_runnable(p[0], false).unwrap();
        assert_eq!(pick(&mut s, 5), Decision::Idle);
        assert_eq!(s.current_pid(), None);

        let mut empty = Scheduler::default();
        assert_eq!(pick(&mut empty, 5), Decision::Idle);
    }

    #[test]
    fn first_dispatch_is_recorded_once() {
        let mut s = Scheduler::default();
        let pid = s.spawn(Millis(10), TaskFlags::empty()).unwrap();

        pick(&mut s, 60);
        pick(&mut s, 90);
        let t = s.task(pid).unwrap();
        assert_eq!(t.first_scheduled(), Some(Millis(60)));
        assert_eq!(t.last_run_start(), Some(Millis(90)));
        assert_eq!(s.stats(pid).unwrap().response_ms, Some(50));
    }

    #[test]
    fn first_dispatch_before_creation_is_clamped() {
        let mut s = Scheduler::default();
        let pid = s.spawn(Millis(100), TaskFlags::empty()).unwrap();

        assert_eq!(pick(&mut s, 40), Decision::Run(pid));
        let t = s.task(pid).unwrap();
        assert_eq!(t.first_scheduled(), Some(Millis(100)));
        assert!(t.first_scheduled() >= Some(t.create_time()));

        let stats = s.exit(pid, Millis(200)).unwrap();
        assert_eq!(stats.response_ms, Some(0));
    }

    #[test]
    fn periodic_reset_restores_every_task() {
        let (mut s, p) = with_levels(&[4, 2, 1]);
        s.last_reset = Millis(100);

        let mut events = Vec::new();
        s.schedule(Millis(9_999), false, |e| events.push(e));
        assert!(events.is_empty());
        assert_eq!(s.task(p[0]).unwrap().level(), 4);

        s.schedule(Millis(10_100), false, |e| events.push(e));
        assert_eq!(events, [SchedEvent::LevelsReset { at: Millis(10_100) }]);
        for pid in &p {
            let t = s.task(*pid).unwrap();
            assert_eq!(t.level(), 0);
            assert_eq!(t.budget(), LevelBudget::Remaining(100));
        }
        assert_eq!(s.last_reset(), Millis(10_100));
    }

    #[test]
    fn backwards_clock_does_not_trigger_reset() {
        let (mut s, p) = with_levels(&[3]);
        s.last_reset = Millis(50_000);
        pick(&mut s, 10);
        assert_eq!(s.task(p[0]).unwrap().level(), 3);
    }

    #[test]
    fn interactive_input_boosts_shell() {
        let mut s = Scheduler::default();
        let worker = s.spawn(Millis(0), TaskFlags::empty()).unwrap();
        let shell = s.spawn(Millis(0), TaskFlags::INTERACTIVE).unwrap();
        s.task_mut(shell).unwrap().mlfq_level = 3;
        s.task_mut(worker).unwrap().mlfq_level = 1;

        let mut events = Vec::new();
        let d = s.schedule(Millis(20), true, |e| events.push(e));

        assert_eq!(events, [SchedEvent::Boosted { pid: shell }]);
        assert_eq!(s.task(shell).unwrap().level(), 0);
        assert_eq!(d, Decision::Run(shell));
    }

    #[test]
    fn boost_without_interactive_task_is_silent() {
        let (mut s, _) = with_levels(&[2]);
        let mut events = Vec::new();
        s.schedule(Millis(1), true, |e| events.push(e));
        assert!(events.is_empty());
    }

    #[test]
    fn exhausted_current_is_demoted_before_selection() {
        let (mut s, p) = with_levels(&[0, 0]);
        assert_eq!(pick(&mut s, 0), Decision::Run(p[0]));
        s.timer_tick(Millis(100));

        let mut events = Vec::new();
        let d = s.schedule(Millis(100), false, |e| events.push(e));
        assert_eq!(events, [SchedEvent::Demoted { pid: p[0], level: 1 }]);
        assert_eq!(d, Decision::Run(p[1]));
        assert_eq!(s.task(p[0]).unwrap().last_run_start(), None);
    }

    #[test]
    fn exit_clears_current_and_reports() {
        let mut s = Scheduler::default();
        let pid = s.spawn(Millis(0), TaskFlags::empty()).unwrap();
        pick(&mut s, 50);
        s.timer_tick(Millis(170));

        let stats = s.exit(pid, Millis(500)).unwrap();
        assert_eq!(stats.turnaround_ms, 500);
        assert_eq!(stats.response_ms, Some(50));
        assert_eq!(stats.cpu_time_ms, 120);
        assert_eq!(stats.timer_interrupts, 1);
        assert_eq!(s.current_pid(), None);
        assert!(s.task(pid).is_none());
        assert_eq!(s.exit(pid, Millis(600)), Err(Error::NoSuchTask(pid)));
    }

    #[test]
    fn pids_are_never_reused() {
        let mut s = Scheduler::default();
        let a = s.spawn(Millis(0), TaskFlags::empty()).unwrap();
        s.exit(a, Millis(1)).unwrap();
        let b = s.spawn(Millis(2), TaskFlags::empty()).unwrap();
        assert_eq!(a, Pid(1));
        assert_eq!(b, Pid(2));
    }

    #[test]
    fn unknown_pid_is_an_error() {
        let mut s = Scheduler::default();
        assert_eq!(s.set_runnable(Pid(77), true), Err(Error::NoSuchTask(Pid(77))));
        assert_eq!(s.boost(Pid(77)), Err(Error::NoSuchTask(Pid(77))));
    }

    proptest! {
        #[test]
        fn selection_is_deterministic(
            tasks in proptest::collection::vec((0u8..=MAX_LEVEL, any::<bool>()), 1..32)
        ) {
            let build = || {
                let mut s = Scheduler::default();
                for &(lvl, runnable) in &tasks {
                    let pid = s.spawn(Millis(0), TaskFlags::empty()).unwrap();
                    let t = s.task_mut(pid).unwrap();
                    t.mlfq_level = lvl;
                    t.budget = LevelBudget::Remaining(1_000);
                    t.set_runnable(runnable);
                }
                s
            };
            let (mut a, mut b) = (build(), build());
            let da = pick(&mut a, 1);
            prop_assert_eq!(da, pick(&mut b, 1));

            let expected = tasks
                .iter()
                .enumerate()
                .filter(|(_, (_, r))| *r)
                .min_by_key(|(i, (lvl, _))| (*lvl, *i))
                .map(|(i, _)| Decision::Run(Pid(i as u32 + 1)))
                .unwrap_or(Decision::Idle);
            prop_assert_eq!(da, expected);
        }

        #[test]
        fn levels_stay_in_range(steps in proptest::collection::vec(1u64..400, 1..200)) {
            let mut s = Scheduler::default();
            s.spawn(Millis(0), TaskFlags::empty()).unwrap();
            s.spawn(Millis(0), TaskFlags::empty()).unwrap();
            let mut now = 0;
            for step in steps {
                now += step;
                s.timer_tick(Millis(now));
                pick(&mut s, now);
                for (_, t) in s.table().iter() {
                    prop_assert!(t.level() <= MAX_LEVEL);
                    if t.at_max_level() {
                        prop_assert_ne!(t.budget(), LevelBudget::Unset);
                    }
                }
            }
        }
    }
}
