//! Out-of-order core simulator CLI.
//!
//! This binary provides a single entry point for the simulator. It performs:
//! 1. **Core run:** Execute JSON instruction programs on the out-of-order core,
//!    optionally draining and resuming part way through.
//! 2. **Coherence demo:** Exercise the functional read/write arbiter and the
//!    checkpoint writeback on a small table-driven coherence system.
//!
//! Logging goes through `tracing`; set `RUST_LOG` (e.g. `RUST_LOG=o3sim_core=debug`)
//! to see the pipeline and arbiter decisions.

use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use o3sim_core::common::{RegId, SimError, SimResult};
use o3sim_core::config::Config;
use o3sim_core::core::DrainState;
use o3sim_core::ruby::{
    AccessPermission, MachineId, MachineType, Packet, RubySystem, SimpleController, SimpleNetwork,
};
use o3sim_core::sim::simulator::{ExitReason, Simulator};
use o3sim_core::sim::source::{ProgramSource, StaticInst};
use o3sim_core::stats::CpuStats;

#[derive(Parser, Debug)]
#[command(
    name = "o3sim",
    author,
    version,
    about = "Cycle-level out-of-order core simulator",
    long_about = "Run instruction programs on the out-of-order core, or exercise the coherence arbiter.\n\nExamples:\n  o3sim run\n  o3sim run --config core.json --program prog.json --drain-at 50\n  o3sim ruby --directories 2"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run programs on the core. Without `--program`, a built-in demo runs.
    Run {
        /// JSON configuration file; defaults are used for missing fields.
        #[arg(short, long)]
        config: Option<String>,

        /// JSON array of programs, one per thread.
        #[arg(short, long)]
        program: Option<String>,

        /// Stop after this many cycles.
        #[arg(long, default_value_t = o3sim_core::sim::simulator::DEFAULT_MAX_CYCLES)]
        max_cycles: u64,

        /// Drain the core at this cycle, then resume it.
        #[arg(long)]
        drain_at: Option<u64>,
    },

    /// Run the coherence arbiter demo and print the resulting cache trace.
    Ruby {
        /// Coherence block size in bytes.
        #[arg(long, default_value_t = 64)]
        block_size: u64,

        /// Directories that lines interleave across.
        #[arg(long, default_value_t = 2)]
        directories: usize,
    },
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            program,
            max_cycles,
            drain_at,
        } => cmd_run(config.as_deref(), program.as_deref(), max_cycles, drain_at),
        Commands::Ruby {
            block_size,
            directories,
        } => cmd_ruby(block_size, directories),
    };

    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

fn read_file(path: &str) -> SimResult<String> {
    fs::read_to_string(path)
        .map_err(|e| SimError::InvalidConfig(format!("cannot read {path}: {e}")))
}

/// Two threads: one counting in r1 through a mispredicted branch, one toggling
/// the vector renaming mode and counting in r2.
fn demo_programs() -> Vec<Vec<StaticInst>> {
    let inc = |r: u16| StaticInst::alu(RegId::int(r), &[RegId::int(r)], 1);
    let mut first: Vec<StaticInst> = (0..20).map(|_| inc(1)).collect();
    first.insert(10, StaticInst::branch(&[RegId::int(1)], true));

    let mut second: Vec<StaticInst> = (0..10).map(|_| inc(2)).collect();
    second.insert(4, StaticInst::write_status(1));
    second.insert(8, StaticInst::write_status(0));
    vec![first, second]
}

/// Runs the core until every thread halts or the cycle limit is hit.
///
/// With `drain_at`, the core is drained at that cycle and resumed once drained,
/// which must not change the committed result.
fn cmd_run(
    config_path: Option<&str>,
    program_path: Option<&str>,
    max_cycles: u64,
    drain_at: Option<u64>,
) -> SimResult<()> {
    let mut config = match config_path {
        Some(path) => Config::from_json(&read_file(path)?)?,
        None => Config::default(),
    };

    let programs = match program_path {
        Some(path) => serde_json::from_str::<Vec<Vec<StaticInst>>>(&read_file(path)?)
            .map_err(|e| SimError::InvalidConfig(format!("bad program {path}: {e}")))?,
        None => {
            println!("[*] No program given, running the built-in demo");
            demo_programs()
        }
    };
    config.cpu.workload_count = programs.len().max(1);
    config.cpu.num_threads = config.cpu.num_threads.max(config.cpu.workload_count);
    let source = ProgramSource::new(programs);

    println!(
        "Configuration: {} thread(s), ROB {} entries, widths {}/{}/{}",
        config.cpu.num_threads,
        config.cpu.rob_entries,
        config.cpu.fetch_width,
        config.cpu.issue_width,
        config.cpu.commit_width
    );

    let mut sim = Simulator::new(config, Box::new(source))?.with_max_cycles(max_cycles);

    if let Some(cycle) = drain_at {
        while sim.stats().cycles < cycle && sim.step()? {}
        if sim.cpu.drain() == DrainState::Draining {
            while sim.cpu.drain_state != DrainState::Drained && sim.step()? {}
        }
        println!(
            "[*] Drained at cycle {} with {} instructions committed",
            sim.stats().cycles,
            sim.stats().total_insts()
        );
        sim.cpu.drain_resume()?;
        info!("resumed after drain");
    }

    let reason = sim.run()?;
    if reason == ExitReason::CycleLimit {
        println!("\n[!] Cycle limit of {max_cycles} reached");
    }

    for tid in 0..sim.cpu.num_threads() {
        let regs: Vec<String> = (0..4)
            .map(|r| sim.cpu.read_arch_reg(tid, RegId::int(r)).map(|v| format!("r{r}={v}")))
            .collect::<SimResult<_>>()?;
        println!("  thread {tid}: {}", regs.join(" "));
    }
    print_stats(sim.stats());
    Ok(())
}

fn print_stats(stats: &CpuStats) {
    println!("\n==========================================================");
    println!("CORE STATISTICS");
    println!("==========================================================");
    println!("  cycles                {}", stats.cycles);
    println!("  idle cycles           {}", stats.idle_cycles);
    println!("  quiesce cycles        {}", stats.quiesce_cycles);
    println!("  instructions          {}", stats.total_insts());
    println!("  ipc                   {:.3}", stats.ipc());
    println!("  fetched               {}", stats.fetched_insts);
    println!("  renamed               {}", stats.renamed_insts);
    println!("  squashed              {}", stats.squashed_insts);
    println!("  branch mispredicts    {}", stats.branch_mispredicts);
    println!("  faults                {}", stats.faults);
    println!("  rename mode switches  {}", stats.mode_switches);
    println!("  free-list stalls      {}", stats.rename_full_stalls);
    println!("  rob-full stalls       {}", stats.rob_full_stalls);
    println!("  iq-full stalls        {}", stats.iq_full_stalls);
    println!("  dcache retries        {}", stats.dcache_retries);
    println!("==========================================================");
}

/// Builds two L1 caches over `directories` interleaved directories, then
/// writes, reads and writes back a few lines.
fn cmd_ruby(block_size: u64, directories: usize) -> SimResult<()> {
    let config = o3sim_core::config::RubyConfig {
        block_size_bytes: block_size,
        ..Default::default()
    };
    let bits = config.block_size_bits();
    let mut sys = RubySystem::new(config)?;

    let line = |n: u64| n * block_size;
    let block = |fill: u8| vec![fill; block_size as usize];

    let mut l1_0 = SimpleController::new(MachineId::new(MachineType::L1Cache, 0), block_size);
    l1_0.set_line(line(1), AccessPermission::ReadWrite, block(0x11));
    l1_0.set_line(line(2), AccessPermission::ReadOnly, block(0x22));
    let mut l1_1 = SimpleController::new(MachineId::new(MachineType::L1Cache, 1), block_size);
    l1_1.set_line(line(2), AccessPermission::ReadOnly, block(0x22));
    l1_1.set_line(line(3), AccessPermission::Busy, block(0x33));
    let _ = sys.register_abstract_controller(Box::new(l1_0));
    let _ = sys.register_abstract_controller(Box::new(l1_1));
    for num in 0..directories.max(1) {
        let dir = SimpleController::directory(num, block_size).with_backing_store();
        let _ = sys.register_abstract_controller(Box::new(dir));
    }
    let mut net = SimpleNetwork::new(bits).with_nodes(MachineType::Directory, directories.max(1));
    net.inject(line(3), block(0x3F));
    sys.register_network(Box::new(net));

    let _ = sys.functional_write(&Packet::write(line(1) + 4, &[0xAA, 0xBB]));
    for n in 1..=4 {
        let mut pkt = Packet::read(line(n), 8);
        let found = sys.functional_read(&mut pkt)?;
        println!("[*] read line {:#x}: found={found} data={:02x?}", line(n), pkt.data);
    }

    sys.mem_writeback()?;
    let trace = sys.cache_trace()?;
    let text = serde_json::to_string_pretty(&trace)
        .map_err(|e| SimError::InvalidConfig(format!("cannot serialize trace: {e}")))?;
    println!("[*] cache trace ({} records):\n{text}", trace.records.len());
    sys.drain_resume();
    Ok(())
}
