//! Симулированное «железо» / Simulated hardware under the scheduler

use kestrel_sched::{Millis, Pid, Platform, SchedEvent};

/// Часы, консоль и счётчики / Clock, console and counters
#[derive(Debug, Default)]
pub struct Machine {
    pub now:        u64,
    input_every:    Option<u64>,
    next_input:     u64,
    pub switches:   u64,
    pub idle_ticks: u64,
    pub demotions:  u64,
    pub boosts:     u64,
    pub resets:     u64,
    last_pid:       Option<Pid>,
}

impl Machine {
    pub fn new(input_every: Option<u64>) -> Self {
        Self {
            input_every: input_every.filter(|&ms| ms > 0),
            next_input:  input_every.unwrap_or(0),
            ..Self::default()
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.saturating_add(ms);
    }
}

impl Platform for Machine {
    fn now_ms(&self) -> Millis {
        Millis(self.now)
    }

    fn switch_to(&mut self, pid: Pid) {
        if self.last_pid != Some(pid) {
            self.switches += 1;
            log::trace!("[sim] {}: switch to pid {}", self.now, pid);
        }
        self.last_pid = Some(pid);
    }

    fn has_pending_interactive_input(&mut self) -> bool {
        let Some(every) = self.input_every else { return false };
        if self.now < self.next_input {
            return false;
        }
        while self.next_input <= self.now {
            self.next_input += every;
        }
        true
    }

    fn idle(&mut self) {
        self.idle_ticks += 1;
        self.last_pid = None;
    }

    fn notify(&mut self, event: &SchedEvent) {
        match event {
            SchedEvent::Demoted { .. }     => self.demotions += 1,
            SchedEvent::Boosted { .. }     => self.boosts += 1,
            SchedEvent::LevelsReset { .. } => self.resets += 1,
        }
    }
}
