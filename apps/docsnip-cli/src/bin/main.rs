use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsnip_core::config::Config;
use docsnip_core::manifest::Manifest;
use docsnip_engine::Retriever;

/// Find the knowledge-base excerpt that best answers a question.
#[derive(Parser)]
#[command(name = "docsnip", version)]
struct Cli {
    /// Source manifest; defaults to `retrieval.manifest` from config.
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve the best snippet for a question (read from stdin when omitted).
    Query {
        text: Option<String>,
        /// Print the tagged result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show how the manifest's sources are chunked.
    Chunks,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,docsnip=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn read_question() -> anyhow::Result<String> {
    println!("**** Please enter your question ****");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        anyhow::bail!("Ticket content is required.");
    }
    println!("**** Processing your request ****");
    Ok(line)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let manifest_path = cli.manifest.clone().unwrap_or_else(|| settings.retrieval.manifest_path());
    let manifest = Manifest::load(&manifest_path)?;
    let retriever = Retriever::from_settings(&settings)?;

    match cli.command {
        Command::Query { text, json } => {
            let question = match text {
                Some(t) if !t.trim().is_empty() => t,
                Some(_) => anyhow::bail!("Ticket content is required."),
                None => read_question()?,
            };
            let result = retriever.retrieve(&manifest, &question).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if let Some(m) = result.as_match() {
                    tracing::debug!(score = m.score, chunk = m.chunk_index, "match details");
                }
                println!("{}", result);
            }
        }
        Command::Chunks => {
            let (report, chunks) = retriever.load_chunks(&manifest).await;
            for failure in &report.failures {
                eprintln!("skipped {}: {}", failure.id, failure.error);
            }
            for chunk in &chunks {
                let preview: String = chunk.text.chars().take(60).collect();
                println!(
                    "{}#{}\t{} chars\t{}",
                    chunk.source_id,
                    chunk.index,
                    chunk.text.chars().count(),
                    preview.replace('\n', " ")
                );
            }
            println!("{} sources, {} chunks", report.sources.len(), chunks.len());
        }
    }
    Ok(())
}
