mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, render_answer, render_list, render_report};
use docqa_domain::{Error, ErrorKind, IngestRequest, QueryRequest, RagConfig};
use docqa_indexer::DocQa;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // stdout carries results, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_main=info,docqa_indexer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<Error>().map(Error::kind) {
                Some(ErrorKind::IndexNotFound) => {
                    eprintln!("{e}\nNo documents have been ingested into this collection yet. Run `docqa ingest` first.");
                    ExitCode::from(2)
                }
                _ => {
                    eprintln!("Error: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RagConfig::from_env()?;
    tracing::debug!(root = %config.vectorstores_root.display(), "Loaded configuration");
    let docqa = DocQa::openai(config);

    match cli.command {
        Command::Ingest { collection, file, mode, chunk_size, chunk_overlap } => {
            let mut request = IngestRequest::new(collection, file).mode(mode);
            request.chunk_size = chunk_size;
            request.chunk_overlap = chunk_overlap;
            let report = docqa.ingest(request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render_report(&report));
            }
        }
        Command::Query { collection, question, top_k } => {
            let mut request = QueryRequest::new(collection, question);
            request.top_k = top_k;
            let answer = docqa.query(request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print!("{}", render_answer(&answer));
            }
        }
        Command::Delete { collection } => {
            docqa.delete(&collection).await?;
            println!("Deleted collection {collection}");
        }
        Command::List => {
            let ids = docqa.list().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                println!("{}", render_list(&ids));
            }
        }
    }
    Ok(())
}
