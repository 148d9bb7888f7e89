use crate::runtime::{embedder, Settings};
use crate::IndexArgs;
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use kale_indexer::{DocumentIndexer, IndexOptions, IndexProgress};

pub(crate) async fn run(settings: &Settings, args: IndexArgs) -> Result<()> {
    let options = IndexOptions {
        chunk_size: args.chunk_size,
        overlap: args.overlap,
        reset: args.reset,
        ..Default::default()
    };
    let indexer = DocumentIndexer::new(
        settings.persist_dir.clone(),
        settings.collection.clone(),
        embedder()?,
        options,
    )
    .context("invalid index options")?;

    let bar = if settings.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} embedding [{bar:40}] {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let stats = indexer
        .index_file_with_progress(&args.document, |IndexProgress { embedded, total }| {
            bar.set_length(total as u64);
            bar.set_position(embedded as u64);
        })
        .await
        .with_context(|| format!("index {}", args.document.display()))?;
    bar.finish_and_clear();

    println!(
        "{} {} chunks from {} into '{}' ({} records, {} ms)",
        style("Indexed").green().bold(),
        stats.chunks,
        args.document.display(),
        settings.collection,
        stats.total_records,
        stats.time_ms
    );
    Ok(())
}
