use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lxgrid", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a config and print its grid, ports and node coverage.
    Check(CheckArgs),
    /// Advance the demo playlist and print the datagrams it would send as hex.
    Dump(DumpArgs),
    /// Run the demo playlist and stream it to the configured ports.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Installation config JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Installation config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Milliseconds to advance before encoding.
    #[arg(long, default_value_t = 0)]
    ms: u32,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Installation config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Stop after this many seconds; runs until interrupted when omitted.
    #[arg(long)]
    seconds: Option<f64>,

    /// Host tick length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Dump(args) => cmd_dump(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn load(path: &Path) -> anyhow::Result<lxgrid::LxConfig> {
    lxgrid::LxConfig::from_path(path).with_context(|| format!("load config '{}'", path.display()))
}

fn demo_playlist(grid: lxgrid::Grid) -> Vec<Box<dyn lxgrid::Pattern>> {
    vec![
        Box::new(lxgrid::IteratorPattern::new(grid)),
        Box::new(lxgrid::HueGradientPattern::new(120.0)),
        Box::new(lxgrid::SolidPattern::new(lxgrid::Color::rgb(255, 140, 40))),
    ]
}

/// Build the facade from a config, attaching `sink` as the output when nodes are configured.
fn build<S: lxgrid::DatagramSink>(
    cfg: &lxgrid::LxConfig,
    sink: S,
) -> anyhow::Result<lxgrid::Lx<S>> {
    let grid = cfg.grid()?;
    let mut lx = lxgrid::Lx::new(grid, demo_playlist(grid))?;
    lx.set_brightness(cfg.brightness);
    lx.engine_mut().set_default_transition(cfg.transition());
    if let Some(ms) = cfg.auto_transition_ms {
        lx.engine_mut().enable_auto_transition(ms);
    }

    if !cfg.nodes.is_empty() {
        let mut output = lxgrid::ThrottledOutput::new(grid, sink);
        output.set_framerate(cfg.framerate)?;
        output.set_node_map(cfg.node_map()?)?;
        lx.attach_output(output)?;
    }
    Ok(lx)
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let cfg = load(&args.config)?;
    let grid = cfg.grid()?;
    println!(
        "grid: {}x{} ({} cells)",
        grid.width(),
        grid.height(),
        grid.total()
    );
    println!("framerate: {}", cfg.framerate);

    if cfg.nodes.is_empty() {
        println!("nodes: none configured");
        return Ok(());
    }
    let map = cfg.node_map()?;
    println!("mapped cells: {}/{}", map.mapped(), map.len());
    for (slot, port) in map.ports().iter().enumerate() {
        println!(
            "port {} on {}: {} nodes",
            port.port,
            port.destination,
            map.node_count(slot)
        );
    }
    Ok(())
}

struct HexDump;

impl lxgrid::DatagramSink for HexDump {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        let hex: Vec<String> = buf.iter().map(|b| format!("{b:02x}")).collect();
        println!("{addr} {}", hex.join(" "));
        Ok(buf.len())
    }
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let cfg = load(&args.config)?;
    let mut lx = build(&cfg, HexDump)?;
    if lx.output().is_none() {
        anyhow::bail!("config '{}' has no nodes to encode", args.config.display());
    }
    lx.tick(i64::from(args.ms), 0)?;
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = load(&args.config)?;
    let socket = std::net::UdpSocket::bind(("0.0.0.0", 0)).context("bind KiNET output socket")?;
    let mut lx = build(&cfg, socket)?;
    if lx.output().is_none() {
        eprintln!("no nodes configured; running without network output");
    }

    let tick = Duration::from_millis(u64::from(args.tick_ms.max(1)));
    let deadline = args
        .seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid --seconds")?;
    let started = Instant::now();
    let mut last = started;
    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now.duration_since(started) >= d) {
            break;
        }
        let delta = i64::try_from(now.duration_since(last).as_millis()).unwrap_or(i64::MAX);
        let now_ms = u64::try_from(now.duration_since(started).as_millis()).unwrap_or(u64::MAX);
        // Only whole milliseconds are consumed; the remainder carries into the next tick.
        last += Duration::from_millis(delta.unsigned_abs());
        lx.tick(delta, now_ms)?;
        std::thread::sleep(tick);
    }

    if let Some(output) = lx.output() {
        let stats = output.stats();
        eprintln!(
            "sent {} frames ({} datagrams), dropped {}, send errors {}",
            stats.sent, stats.datagrams, stats.dropped, stats.send_errors
        );
    }
    Ok(())
}
