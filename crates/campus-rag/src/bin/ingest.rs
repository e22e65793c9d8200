//! Batch ingestion binary
//!
//! Run with: cargo run -p campus-rag --features cli --bin campus-rag-ingest -- docs/

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use campus_rag::{
    config::RagConfig,
    providers::{
        vector_store_from_config, EmbeddingProvider, HuggingFaceEmbedder, VectorStoreProvider,
    },
    FileType, IngestPipeline, IngestSource,
};

#[derive(Parser, Debug)]
#[command(
    name = "campus-rag-ingest",
    about = "Chunk, embed and store .pdf/.txt documents in the campus-rag vector store"
)]
struct Cli {
    /// Files or directories to ingest; directories are walked recursively
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML config file (defaults to $CAMPUS_RAG_CONFIG)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Embed every chunk without first looking up stored content
    #[arg(long, default_value_t = false)]
    no_dedup: bool,

    /// Chunks embedded concurrently per file
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RagConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RagConfig::load()?,
    };
    if cli.config.is_some() {
        config.apply_env_overrides();
    }
    if cli.no_dedup {
        config.vector_store.deduplicate = false;
    }
    if let Some(concurrency) = cli.concurrency {
        config.vector_store.ingest_concurrency = concurrency;
    }
    config.validate()?;

    let files = collect_files(&cli.paths);
    if files.is_empty() {
        anyhow::bail!("no .pdf or .txt files found");
    }

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HuggingFaceEmbedder::new(&config.embeddings)?);
    let store = vector_store_from_config(&config)?;
    let pipeline = IngestPipeline::from_config(&config, embedder, store.clone());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("=> "),
    );

    let start = Instant::now();
    let (mut succeeded, mut failed, mut inserted, mut duplicate) = (0usize, 0usize, 0usize, 0usize);

    for path in &files {
        let name = path.display().to_string();
        pb.set_message(name.clone());

        let result = match tokio::fs::read(path).await {
            Ok(data) => pipeline.ingest(IngestSource::file(name.clone(), data)).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(report) => {
                succeeded += 1;
                inserted += report.chunks_inserted;
                duplicate += report.chunks_duplicate;
                pb.println(format!(
                    "{} {} ({}/{} chunks inserted, {} duplicate, {} failed)",
                    style("✓").green(),
                    name,
                    report.chunks_inserted,
                    report.total_chunks,
                    report.chunks_duplicate,
                    report.errors.len()
                ));
            }
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", style("✗").red(), name, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "\n{} {} files ingested, {} failed, {} chunks inserted, {} duplicate in {:.1}s",
        style("Done:").bold(),
        succeeded,
        failed,
        inserted,
        duplicate,
        start.elapsed().as_secs_f64()
    );
    match store.len().await {
        Ok(rows) => println!("{} rows now in the {} store", rows, store.name()),
        Err(e) => tracing::warn!("Could not count stored rows: {}", e),
    }

    if succeeded == 0 {
        anyhow::bail!("every file failed to ingest");
    }
    Ok(())
}

/// Expand `paths` into supported files; missing paths are reported and skipped
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            eprintln!("{} {} does not exist, skipping", style("!").yellow(), path.display());
            continue;
        }
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        files.extend(
            WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_supported(p)),
        );
    }
    files.sort();
    files
}

fn is_supported(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| FileType::from_filename(n).is_supported())
}
