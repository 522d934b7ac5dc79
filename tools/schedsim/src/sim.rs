//! Цикл симуляции / Simulation loop
//!
//! Каждый тик: часы += tick, IRQ таймера, прогресс нагрузки, reschedule.
//! Every tick: clock += tick, timer IRQ, workload progress, reschedule.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Context, Result};
use kestrel_sched::{Decision, ExitStats, Millis, Pid, SchedConfig, Scheduler, TaskFlags, TaskStats};

use crate::machine::Machine;
use crate::workload::{TaskSpec, Workload};

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub sched:       SchedConfig,
    pub tick_ms:     u64,
    pub duration_ms: u64,
    pub io_burst_ms: u64,
    pub io_wait_ms:  u64,
    pub input_every: Option<u64>,
    pub interactive: Option<String>,
}

pub struct Report {
    pub finished:   Vec<(String, ExitStats)>,
    pub unfinished: Vec<(String, TaskStats)>,
    pub machine:    Machine,
}

enum Progress {
    Running,
    Done,
    Block,
}

pub fn run(cfg: &SimConfig, mut specs: Vec<TaskSpec>) -> Result<Report> {
    if cfg.tick_ms == 0 {
        bail!("tick must be at least 1 ms");
    }
    if let Some(name) = &cfg.interactive {
        if !specs.iter().any(|s| &s.name == name) {
            bail!("interactive task `{name}` is not in the workload");
        }
    }

    specs.sort_by_key(|s| s.arrival_ms);
    let mut pending = specs.into_iter().peekable();

    let mut sched = Scheduler::new(cfg.sched);
    let mut machine = Machine::new(cfg.input_every);
    let mut live: BTreeMap<Pid, Workload> = BTreeMap::new();
    let mut finished = Vec::new();

    loop {
        let now = machine.now;

        // Прибытие новых задач / Admit arrivals
        while let Some(spec) = pending.next_if(|s| s.arrival_ms <= now) {
            let flags = match &cfg.interactive {
                Some(name) if *name == spec.name => TaskFlags::INTERACTIVE,
                _ => TaskFlags::empty(),
            };
            let pid = sched.spawn(Millis(now), flags)
                .with_context(|| format!("spawning task `{}`", spec.name))?;
            log::debug!("[sim] {}: `{}` arrives as pid {}", now, spec.name, pid);
            live.insert(pid, Workload::new(spec));
        }

        let before = sched.current_pid();
        if let Decision::Run(pid) = sched.reschedule(&mut machine) {
            if before != Some(pid) {
                let cpu = sched.task(pid).map_or(0, |t| t.cpu_time_ms());
                if let Some(w) = live.get_mut(&pid) {
                    w.burst_start = cpu;
                }
            }
        }

        if machine.now >= cfg.duration_ms || (live.is_empty() && pending.peek().is_none()) {
            break;
        }

        machine.advance(cfg.tick_ms);
        let now = Millis(machine.now);
        sched.timer_tick(now);

        if let Some(pid) = sched.current_pid() {
            let cpu = sched.task(pid).map_or(0, |t| t.cpu_time_ms());
            let progress = match live.get(&pid) {
                Some(w) if w.is_done(cpu) => Progress::Done,
                Some(w) if w.wants_to_block(cpu, cfg.io_burst_ms) => Progress::Block,
                _ => Progress::Running,
            };

            match progress {
                Progress::Done => {
                    let stats = sched.exit(pid, now).context("finishing task")?;
                    if let Some(w) = live.remove(&pid) {
                        finished.push((w.spec.name, stats));
                    }
                }
                Progress::Block => {
                    sched.set_runnable(pid, false)?;
                    if let Some(w) = live.get_mut(&pid) {
                        w.wake_at = Some(machine.now + cfg.io_wait_ms);
                    }
                }
                Progress::Running => {}
            }
        }

        // Пробуждение после I/O / Wake after I/O
        for (pid, w) in live.iter_mut() {
            if matches!(w.wake_at, Some(t) if t <= machine.now) {
                w.wake_at = None;
                sched.set_runnable(*pid, true)?;
            }
        }
    }

    let unfinished = live
        .iter()
        .filter_map(|(pid, w)| sched.stats(*pid).map(|s| (w.spec.name.clone(), s)))
        .collect();

    Ok(Report { finished, unfinished, machine })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>4} {:>11} {:>9} {:>9} {:>6}",
            "task", "pid", "turnaround", "response", "cpu", "ticks")?;
        for (name, s) in &self.finished {
            let response = s.response_ms.map_or_else(|| "-".to_owned(), |ms| ms.to_string());
            writeln!(f, "{:<12} {:>4} {:>11} {:>9} {:>9} {:>6}",
                name, s.pid.0, s.turnaround_ms, response, s.cpu_time_ms, s.timer_interrupts)?;
        }
        for (name, s) in &self.unfinished {
            writeln!(f, "{:<12} {}  (unfinished)", name, s)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "elapsed {} ms, {} switches, {} idle, {} demotions, {} boosts, {} resets",
            self.machine.now, self.machine.switches, self.machine.idle_ticks,
            self.machine.demotions, self.machine.boosts, self.machine.resets,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        SimConfig {
            sched:       SchedConfig::new(),
            tick_ms:     10,
            duration_ms: 60_000,
            io_burst_ms: 10,
            io_wait_ms:  50,
            input_every: None,
            interactive: None,
        }
    }

    fn specs(list: &[&str]) -> Vec<TaskSpec> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn single_cpu_task_runs_to_completion() {
        let report = run(&cfg(), specs(&["job:300"])).unwrap();
        assert!(report.unfinished.is_empty());
        let (name, stats) = &report.finished[0];
        assert_eq!(name, "job");
        assert_eq!(stats.cpu_time_ms, 300);
        assert_eq!(stats.turnaround_ms, 300);
        assert_eq!(stats.response_ms, Some(0));
        assert_eq!(report.machine.demotions, 1);
    }

    #[test]
    fn late_arrival_gets_the_cpu_first() {
        let report = run(&cfg(), specs(&["hog:1000", "late:50@200"])).unwrap();
        let order: Vec<&str> = report.finished.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, ["late", "hog"]);

        let late = &report.finished[0].1;
        assert_eq!(late.response_ms, Some(0));
        assert_eq!(late.turnaround_ms, 50);
    }

    #[test]
    fn io_task_blocks_between_bursts() {
        let report = run(&cfg(), specs(&["io:30:io"])).unwrap();
        let stats = &report.finished[0].1;
        assert_eq!(stats.cpu_time_ms, 30);
        assert!(stats.turnaround_ms > 100);
        assert!(report.machine.idle_ticks > 0);
    }

    #[test]
    fn duration_cuts_the_run_short() {
        let mut c = cfg();
        c.duration_ms = 200;
        let report = run(&c, specs(&["hog:5000"])).unwrap();
        assert!(report.finished.is_empty());
        assert_eq!(report.unfinished.len(), 1);
        assert_eq!(report.unfinished[0].1.cpu_time_ms, 200);
    }

    #[test]
    fn unknown_interactive_task_is_rejected() {
        let mut c = cfg();
        c.interactive = Some("shell".into());
        assert!(run(&c, specs(&["job:10"])).is_err());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let mut c = cfg();
        c.tick_ms = 0;
        assert!(run(&c, specs(&["job:10"])).is_err());
    }
}
