use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wavyte_reel::{
    CodecKind, Composer, DirAssetStore, EngineConfig, MediaBuffer, ProgressTracker, Timeline,
};

#[derive(Parser, Debug)]
#[command(name = "wavyte-reel", version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a timeline into one output file.
    Compose(ComposeArgs),
    /// Print stream information of a media file as JSON.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// Directory asset ids are resolved against.
    #[arg(long)]
    assets: PathBuf,

    /// Directory the output is written into.
    #[arg(long)]
    out: PathBuf,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured codec.
    #[arg(long, value_enum)]
    codec: Option<CodecArg>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Media file to inspect.
    #[arg(long)]
    file: PathBuf,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured codec.
    #[arg(long, value_enum)]
    codec: Option<CodecArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecArg {
    Ffmpeg,
    Raw,
}

impl From<CodecArg> for CodecKind {
    fn from(v: CodecArg) -> Self {
        match v {
            CodecArg::Ffmpeg => CodecKind::Ffmpeg,
            CodecArg::Raw => CodecKind::Raw,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "wavyte_reel=debug,info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, codec: Option<CodecArg>) -> anyhow::Result<EngineConfig> {
    let cfg = match path {
        Some(p) => EngineConfig::from_path(p)?,
        None => EngineConfig::default(),
    };
    let mut cfg = cfg.with_env_overrides()?;
    if let Some(c) = codec {
        cfg.codec = c.into();
    }
    Ok(cfg)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<ExitCode> {
    let json = std::fs::read_to_string(&args.timeline)
        .with_context(|| format!("read timeline '{}'", args.timeline.display()))?;
    let timeline = Timeline::from_json(&json)?;
    let config = load_config(args.config.as_ref(), args.codec)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let store = Arc::new(DirAssetStore::new(args.assets.clone(), args.out.clone()));
    let composer = Composer::new(config, store.clone(), store)?;

    let mut tracker = ProgressTracker::new(composer.config().progress_capacity);
    let events = tracker.subscribe();
    let printer = std::thread::spawn(move || {
        for e in events {
            eprintln!("[{:>5.1}%] {}", e.percent, e.stage);
        }
    });
    let result = composer.compose_tracked(&timeline, &mut tracker);
    drop(tracker);
    if printer.join().is_err() {
        tracing::warn!("progress printer panicked");
    }

    println!("{}", result.to_json_pretty());
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_ref(), args.codec)?;
    let bytes =
        std::fs::read(&args.file).with_context(|| format!("read '{}'", args.file.display()))?;
    let codec = config.build_codec();
    let info = codec.probe(&MediaBuffer::new(bytes))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&info).context("serialize media info")?
    );
    Ok(ExitCode::SUCCESS)
}
