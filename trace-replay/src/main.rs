use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use trace_replay::{scripts, JsonSink, ReplayBundle, ReplayConfig, RunKind, RunSink};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "trace-replay",
    version,
    about = "Replay a recorded EVM transaction through analysis scripts"
)]
struct Cli {
    /// Replay bundle (JSON)
    #[arg(value_name = "BUNDLE", required_unless_present = "list")]
    bundle: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scripts to enable (comma separated, default all)
    #[arg(short, long = "script", value_delimiter = ',', value_name = "ID")]
    scripts: Vec<String>,

    /// Lifecycle to run
    #[arg(long, value_enum)]
    run: Option<RunKind>,

    /// Abort the run after this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Write output here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// List built-in scripts and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    fn config(&self) -> Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_file(path)?,
            None => ReplayConfig::default(),
        };

        if !self.scripts.is_empty() {
            config.scripts = self.scripts.clone();
        }
        if let Some(run) = self.run {
            config.run = run;
        }
        if self.timeout_ms.is_some() {
            config.timeout_ms = self.timeout_ms;
        }
        if self.output.is_some() {
            config.output = self.output.clone();
        }
        config.pretty |= self.pretty;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        for script in scripts::builtin() {
            println!("{}\t{}", script.id(), script.depends_on().join(","));
        }
        return Ok(());
    }

    let config = cli.config()?;
    let bundle = cli.bundle.as_ref().context("No replay bundle given")?;
    let env = ReplayBundle::from_file(bundle)?.into_environment()?;

    let output = trace_replay::replay(&env, &config).await?;

    let mut sink: Box<dyn RunSink> = match &config.output {
        Some(path) => Box::new(JsonSink::create(path)?.pretty(config.pretty)),
        None => Box::new(JsonSink::new(io::stdout()).pretty(config.pretty)),
    };
    sink.publish(&output)?;

    tracing::info!("Run {} done", output.run_id);
    Ok(())
}
