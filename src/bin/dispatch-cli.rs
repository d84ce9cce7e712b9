use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use backend_dispatch::config::{load_config, DispatchConfig};
use backend_dispatch::dispatch::Dispatcher;
use backend_dispatch::index::{artifact, global, PatternIndex};
use backend_dispatch::lifecycle::startup::load_index;

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Maintenance CLI for the backend dispatcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexSource {
    /// Build from this configuration instead of the builtin table.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load a previously written artifact instead of building.
    #[arg(short, long, conflicts_with = "config")]
    artifact: Option<PathBuf>,
}

#[derive(Args)]
struct Remote {
    #[arg(short, long, default_value = "http://127.0.0.1:4567")]
    url: String,

    #[arg(short, long, env = "DISPATCH_ADMIN_KEY")]
    key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pattern index and write it as an artifact
    Build {
        #[command(flatten)]
        source: IndexSource,

        /// Artifact destination (defaults to the configured artifact_path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show which backend a URL dispatches to
    Resolve {
        url: String,

        #[command(flatten)]
        source: IndexSource,
    },
    /// List index entries in match order
    List {
        #[command(flatten)]
        source: IndexSource,
    },
    /// Query a running dispatcher's status
    Status {
        #[command(flatten)]
        remote: Remote,
    },
    /// Query a running dispatcher's per-backend counters
    Stats {
        #[command(flatten)]
        remote: Remote,
    },
}

fn load(source: &IndexSource) -> Result<PatternIndex, Box<dyn std::error::Error>> {
    if let Some(path) = &source.artifact {
        return Ok(artifact::load(path)?);
    }
    match &source.config {
        Some(path) => {
            let mut config: DispatchConfig = load_config(path)?;
            // The build command decides where to write
            config.index.artifact_path = None;
            config.index.prefer_artifact = false;
            Ok(load_index(&config)?)
        }
        None => Ok(global::builtin()?.clone()),
    }
}

fn artifact_target(source: &IndexSource, out: Option<PathBuf>) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if out.is_some() {
        return Ok(out);
    }
    match &source.config {
        Some(path) => Ok(load_config(path)?.index.artifact_path.map(PathBuf::from)),
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { source, out } => {
            let index = load(&source)?;
            let target = artifact_target(&source, out)?;
            if let Some(path) = &target {
                artifact::write(&index, Path::new(path))?;
            }
            print_json(&json!({
                "entries": index.len(),
                "backends": index.backends().len(),
                "artifact": target.map(|p| p.display().to_string()),
            }))?;
        }
        Commands::Resolve { url, source } => {
            let dispatcher = Dispatcher::from(load(&source)?);
            let entry = dispatcher.resolve_entry(&url);
            print_json(&json!({
                "url": url,
                "backend": entry.map(|e| e.backend.to_string()),
                "pattern": entry.map(|e| e.pattern.source().to_string()),
            }))?;
        }
        Commands::List { source } => {
            let index = load(&source)?;
            let entries: Vec<Value> = index
                .iter()
                .map(|e| json!({ "backend": e.backend, "pattern": e.pattern.source() }))
                .collect();
            print_json(&Value::Array(entries))?;
        }
        Commands::Status { remote } => {
            fetch(&remote, "/admin/status").await?;
        }
        Commands::Stats { remote } => {
            fetch(&remote, "/admin/stats").await?;
        }
    }

    Ok(())
}

async fn fetch(remote: &Remote, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", remote.key))?,
    );

    let res = client
        .get(format!("{}{}", remote.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    print_json(&json)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
