use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{input, output};
use phishguard_core::config;
use phishguard_core::config::AppConfig;
use phishguard_core::pipeline;
use std::path::PathBuf;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify {
            text,
            file,
            json,
            fields,
        } => run_classify(cfg, text, file, json, fields).await,
        Commands::Corpus { json } => run_corpus(cfg, json).await,
    }
}

#[derive(Parser)]
#[command(name = "phishguard")]
#[command(about = "Semantic phishing email detector", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an email body as safe, suspicious or phishing
    Classify {
        /// Email text; read from --file or stdin when omitted
        text: Option<String>,
        /// Read the email body from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Restrict JSON output fields (comma-separated), e.g. label,confidence
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
    },
    /// Load and validate the reference corpus, then print a summary
    Corpus {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_classify(
    cfg: AppConfig,
    text: Option<String>,
    file: Option<PathBuf>,
    json: bool,
    fields: Vec<String>,
) -> Result<()> {
    let body = input::read_body(text, file.as_deref(), std::io::stdin().lock())?;
    let classifier = pipeline::build_classifier(&cfg).await?;
    let verdict = match classifier.classify(&body).await {
        Ok(v) => v,
        Err(e) => {
            if !e.is_client_error() {
                error!("classification failed: {}", e);
            }
            return Err(e.into());
        }
    };
    if json {
        let value = output::verdict_json(&verdict, &fields)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", output::render_text(&verdict));
    }
    Ok(())
}

async fn run_corpus(cfg: AppConfig, json: bool) -> Result<()> {
    let classifier = pipeline::build_classifier(&cfg).await?;
    let summary = output::corpus_summary(classifier.corpus(), &cfg.embeddings.provider);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "corpus: {} entries, dimension {}, {} trusted domains (provider {})",
            summary["entries"],
            summary["dimension"],
            summary["trusted_domains"],
            cfg.embeddings.provider
        );
    }
    Ok(())
}
