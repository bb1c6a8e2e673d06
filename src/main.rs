mod config;
mod event;
pub mod pipeline;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::thread;

use config::RipConfig;
use event::{EventSink, RipEvent};
use pipeline::driver::PipelineDriver;

#[derive(Parser, Debug)]
#[command(name = "xenorip", version)]
#[command(about = "Rips sprites from a Xenogears PSX disc image into transparent PNGs")]
struct Cli {
    /// Path to the NA disc image (.bin); optional once extracted data exists
    disc_image: Option<PathBuf>,

    /// Working directory for extraction and decoding
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory holding the external decode scripts
    #[arg(long)]
    tools: Option<PathBuf>,

    /// Where the finished sprite tree is moved to
    #[arg(long)]
    final_dir: Option<PathBuf>,

    /// Worker threads (default: logical processors minus one)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Key transparency off each sprite's top-left corner pixel instead of
    /// keeping the decoded alpha channel
    #[arg(long)]
    legacy_corner_key: bool,

    /// Keep the intermediate bitmap container beside each PNG
    #[arg(long)]
    keep_bmp: bool,

    /// Only report stage progress and failures
    #[arg(short, long)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> Result<RipConfig> {
    let mut config = match &cli.config {
        Some(path) => RipConfig::load(path)?,
        None => RipConfig::default(),
    };

    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(tools) = &cli.tools {
        config.tools_dir = tools.clone();
    }
    if let Some(final_dir) = &cli.final_dir {
        config.final_dir = final_dir.clone();
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    config.legacy_corner_key |= cli.legacy_corner_key;
    config.keep_bmp |= cli.keep_bmp;
    Ok(config)
}

fn print_events(rx: crossbeam_channel::Receiver<RipEvent>, quiet: bool) {
    for event in rx {
        match event {
            RipEvent::StageStarted(stage) => println!("==> {stage}"),
            RipEvent::StageSkipped { stage, marker } => {
                println!("==> {stage}: {} already exists, skipping", marker.display())
            }
            RipEvent::StageCompleted(stage) => println!("==> {stage} done"),
            RipEvent::JobStarted(path) => {
                if !quiet {
                    println!("    {}", path.display());
                }
            }
            RipEvent::JobSucceeded(_) | RipEvent::JobSkipped(_) => {}
            RipEvent::JobFailed { path, error } => {
                eprintln!("    failed {}: {}", path.display(), error)
            }
            RipEvent::Log(message) => {
                if !quiet {
                    println!("    {message}");
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let (sink, rx) = EventSink::channel();
    let quiet = cli.quiet;
    let printer = thread::spawn(move || print_events(rx, quiet));

    let driver = PipelineDriver::new(config, sink);
    let result = driver.run(cli.disc_image.as_deref());
    drop(driver);
    let _ = printer.join();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
