//! schedsim — прогон планировщика Kestrel на хосте
//! schedsim — runs the Kestrel scheduler on the host
//!
//! Пример / Example:
//!   RUST_LOG=info schedsim --task shell:200:io --task build:3000 \
//!       --task late:100@2000 --interactive shell --input-every 500

use anyhow::{Context, Result};
use clap::Parser;
use kestrel_sched::config::{QUOTA_STEP_MS, RESET_INTERVAL_MS};
use kestrel_sched::SchedConfig;

mod machine;
mod sim;
mod workload;

use sim::SimConfig;
use workload::TaskSpec;

#[derive(Parser, Debug)]
#[command(name = "schedsim", version, about = "Simulate the Kestrel MLFQ scheduler")]
struct Args {
    /// Task to run, repeatable
    #[arg(short, long = "task", value_name = "NAME:CPU_MS[:io][@ARRIVAL_MS]", required = true)]
    tasks: Vec<TaskSpec>,

    /// Task that receives the console-input boost
    #[arg(long, value_name = "NAME")]
    interactive: Option<String>,

    /// Console input arrives every this many ms
    #[arg(long, value_name = "MS")]
    input_every: Option<u64>,

    /// Timer interrupt period
    #[arg(long, value_name = "MS", default_value_t = 10)]
    tick: u64,

    /// Stop the simulation after this much simulated time
    #[arg(long, value_name = "MS", default_value_t = 30_000)]
    duration: u64,

    /// Level-0 quota; level N gets (N + 1) times this
    #[arg(long, value_name = "MS", default_value_t = QUOTA_STEP_MS)]
    quota_step: u64,

    /// Period of the starvation-avoidance reset
    #[arg(long, value_name = "MS", default_value_t = RESET_INTERVAL_MS)]
    reset_interval: u64,

    /// CPU burst of an io task before it blocks
    #[arg(long, value_name = "MS", default_value_t = 10)]
    io_burst: u64,

    /// How long an io task stays blocked
    #[arg(long, value_name = "MS", default_value_t = 50)]
    io_wait: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = SimConfig {
        sched: SchedConfig {
            quota_step_ms:     args.quota_step,
            reset_interval_ms: args.reset_interval,
        },
        tick_ms:     args.tick,
        duration_ms: args.duration,
        io_burst_ms: args.io_burst,
        io_wait_ms:  args.io_wait,
        input_every: args.input_every,
        interactive: args.interactive,
    };
    log::debug!("[sim] {:?}", cfg);

    let report = sim::run(&cfg, args.tasks).context("simulation failed")?;
    print!("{}", report);
    Ok(())
}
