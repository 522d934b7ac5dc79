//! Описание нагрузки симулятора / Simulated workload description
//!
//! Формат / Format: `NAME:CPU_MS[:io][@ARRIVAL_MS]`
//!   cpu-bound  — `build:1500`
//!   i/o-bound  — `editor:200:io@300`

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Крутится на CPU до конца / Spins until its demand is met
    Cpu,
    /// Короткие всплески и сон / Short bursts, then sleeps
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name:       String,
    pub demand_ms:  u64,
    pub kind:       Kind,
    pub arrival_ms: u64,
}

impl FromStr for TaskSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, arrival_ms) = match s.split_once('@') {
            Some((body, at)) => {
                let at = at.parse().map_err(|_| format!("bad arrival time in `{s}`"))?;
                (body, at)
            }
            None => (s, 0),
        };

        let mut parts = body.split(':');
        let name = parts.next().filter(|n| !n.is_empty())
            .ok_or_else(|| format!("missing task name in `{s}`"))?;
        let demand_ms = parts.next()
            .ok_or_else(|| format!("missing CPU demand in `{s}`"))?
            .parse()
            .map_err(|_| format!("bad CPU demand in `{s}`"))?;
        let kind = match parts.next() {
            None | Some("cpu") => Kind::Cpu,
            Some("io")         => Kind::Io,
            Some(other)        => return Err(format!("unknown task kind `{other}`")),
        };
        if parts.next().is_some() {
            return Err(format!("trailing fields in `{s}`"));
        }

        Ok(TaskSpec { name: name.to_owned(), demand_ms, kind, arrival_ms })
    }
}

/// Состояние задачи во время прогона / Per-task runtime state
#[derive(Debug)]
pub struct Workload {
    pub spec:        TaskSpec,
    /// CPU time at the start of the current burst.
    pub burst_start: u64,
    /// Sleeping I/O task wakes up at this instant.
    pub wake_at:     Option<u64>,
}

impl Workload {
    pub fn new(spec: TaskSpec) -> Self {
        Self { spec, burst_start: 0, wake_at: None }
    }

    pub fn is_done(&self, cpu_time_ms: u64) -> bool {
        cpu_time_ms >= self.spec.demand_ms
    }

    /// I/O tasks give up the CPU after `burst_ms` of use.
    pub fn wants_to_block(&self, cpu_time_ms: u64, burst_ms: u64) -> bool {
        self.spec.kind == Kind::Io && cpu_time_ms.saturating_sub(self.burst_start) >= burst_ms
    }
}
