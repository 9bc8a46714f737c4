use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use metric_mongrel::config::{self, ConfigError};
use metric_mongrel::{
    CounterEvent, EmitError, MetadataValue, MetricCollector, MetricEvent, MetricOrigin,
    ModelIoEvent, RequestMetadata,
};

#[derive(Parser)]
#[command(name = "mongrel-cli")]
#[command(about = "Send metrics to a Metric Mongrel collector by hand", long_about = None)]
struct Cli {
    /// TOML config file; MM_* environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Increment a counter
    Increment {
        name: String,

        #[arg(long, default_value_t = 1.0)]
        value: f64,

        #[arg(long, value_enum)]
        origin: Option<Origin>,

        /// Extra key=value metadata, repeatable
        #[arg(short, long = "meta", value_parser = parse_metadata)]
        metadata: Vec<(String, MetadataValue)>,
    },
    /// Record a model input/output pair
    ModelIo {
        model: String,
        input: String,
        output: String,

        /// Extra key=value metadata, repeatable
        #[arg(short, long = "meta", value_parser = parse_metadata)]
        metadata: Vec<(String, MetadataValue)>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Origin {
    Auto,
    Manual,
}

impl From<Origin> for MetricOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Auto => MetricOrigin::Automatic,
            Origin::Manual => MetricOrigin::Manual,
        }
    }
}

/// `key=value`, with integers, floats and booleans typed as such.
fn parse_metadata(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }

    let value = if let Ok(i) = value.parse::<i64>() {
        MetadataValue::Int(i)
    } else if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        MetadataValue::Float(f)
    } else if let Ok(b) = value.parse::<bool>() {
        MetadataValue::Bool(b)
    } else {
        MetadataValue::Str(value.to_string())
    };
    Ok((key.to_string(), value))
}

fn load(path: Option<PathBuf>) -> Result<MetricCollector, ConfigError> {
    let config = match path {
        Some(path) => config::load_config(&path)?,
        None => config::from_env()?,
    };
    MetricCollector::new(config)
}

fn build_event(command: Commands) -> MetricEvent {
    match command {
        Commands::Increment {
            name,
            value,
            origin,
            metadata,
        } => {
            let mut event = CounterEvent::new(name).value(value);
            if let Some(origin) = origin {
                event = event.origin(origin.into());
            }
            if !metadata.is_empty() {
                event = event.metadata(metadata.into_iter().collect::<RequestMetadata>());
            }
            event.into()
        }
        Commands::ModelIo {
            model,
            input,
            output,
            metadata,
        } => {
            let mut event = ModelIoEvent::new(model, input, output);
            if !metadata.is_empty() {
                event = event.metadata(metadata.into_iter().collect::<RequestMetadata>());
            }
            event.into()
        }
    }
}

/// Send once and describe where it went. Unlike the library paths, the
/// operator wants to know if it failed.
async fn send(collector: &MetricCollector, event: &MetricEvent) -> Result<String, EmitError> {
    collector.try_send(event).await?;
    Ok(format!(
        "sent {} to {}",
        event.endpoint().path(),
        collector.endpoint_url(event.endpoint())
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    metric_mongrel::logging::init_tracing("metric_mongrel=info");

    let cli = Cli::parse();
    let collector = load(cli.config)?;
    let event = build_event(cli.command);

    // An error here exits non-zero.
    println!("{}", send(&collector, &event).await?);
    Ok(())
}
