use anyhow::Context;
use clap::Parser;
use logsift::Pipeline;
use logsift_core::{Config, PartKind, ValueKind};
use logsift_emit::{file_emitter, Emitter, PartFilter, SinkSet, FULL_LOG, INTS_LOG};
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "logsift",
    about = "Extract typed name/value fields and a field dictionary from diagnostic-bundle logs"
)]
struct Cli {
    /// Bundle directories to process.
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Extra configuration file layered over the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Concurrent file workers (0 = one per CPU).
    #[arg(long)]
    workers: Option<usize>,

    /// Write the field dictionary as JSON here.
    #[arg(long)]
    dict_path: Option<PathBuf>,

    /// Write NAME × INT observations as graph JSON here.
    #[arg(long)]
    graph_path: Option<PathBuf>,

    /// Also write full.log (FULL parts) and ints.log (NAME × INT) here.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Parts printed on stdout: FULL, NAME, MIDS, ENDS.
    #[arg(long, value_delimiter = ',')]
    emit_parts: Option<Vec<PartKind>>,

    /// Value types printed on stdout: INT, STRING.
    #[arg(long, value_delimiter = ',')]
    emit_types: Option<Vec<ValueKind>>,

    /// Echo each entry's original lines on stdout.
    #[arg(long)]
    emit_orig: bool,

    /// More logging on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }
    if let Some(parts) = &cli.emit_parts {
        config.emit.parts = parts.clone();
    }
    if let Some(types) = &cli.emit_types {
        config.emit.types = types.clone();
    }
    config.emit.orig |= cli.emit_orig;

    let mut sinks = SinkSet::new().with_emitter(Emitter::stdout(PartFilter::new(
        config.emit.parts.iter().copied(),
        config.emit.types.iter().copied(),
    )));
    if config.emit.orig {
        sinks = sinks.with_echo(Box::new(std::io::stdout()));
    }
    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        sinks = sinks
            .with_emitter(file_emitter(dir, FULL_LOG, PartFilter::new([PartKind::Full], []))?)
            .with_emitter(file_emitter(
                dir,
                INTS_LOG,
                PartFilter::new([PartKind::Name], [ValueKind::Int]),
            )?);
    }
    if cli.graph_path.is_some() {
        sinks = sinks.with_graph();
    }

    let mut pipeline = Pipeline::new(config, cli.dirs.clone(), sinks);
    if let Some(path) = &cli.dict_path {
        pipeline = pipeline.with_dict_path(path);
    }
    let mut report = pipeline.run().await?;
    report.sink.flush().context("flushing output")?;

    if let (Some(path), Some(graph)) = (&cli.graph_path, report.sink.take_graph()) {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating graph file {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &graph)?;
        tracing::info!(path = %path.display(), observations = graph.len(), "graph data written");
    }

    let summary = &report.summary;
    tracing::info!(
        files = summary.files_processed,
        skipped = summary.files_skipped,
        bytes = summary.bytes_processed(),
        min_ts = ?summary.min_timestamp,
        max_ts = ?summary.max_timestamp,
        "done"
    );
    Ok(())
}
