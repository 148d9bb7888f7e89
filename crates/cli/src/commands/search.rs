use crate::runtime::{retriever, Settings};
use crate::SearchArgs;
use anyhow::{Context, Result};
use console::style;
use kale_search::DEFAULT_RETRIEVAL_TIMEOUT;
use serde_json::json;

const PREVIEW_CHARS: usize = 240;

pub(crate) async fn run(settings: &Settings, args: SearchArgs) -> Result<()> {
    let retriever = retriever(settings, DEFAULT_RETRIEVAL_TIMEOUT).await?;
    let hits = retriever
        .retrieve_scored(&args.query, args.top_k)
        .await
        .context("retrieval failed")?;

    if args.json {
        let results: Vec<_> = hits
            .iter()
            .map(|hit| {
                json!({
                    "id": hit.id,
                    "score": hit.score,
                    "index": hit.chunk.index,
                    "start": hit.chunk.start,
                    "source": hit.chunk.source_tag,
                    "text": hit.chunk.text,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "results": results }))?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("{}", style("No results").yellow());
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("#{}", rank + 1)).bold(),
            style(format!("{:.3}", hit.score)).cyan(),
            style(&hit.id).dim()
        );
        let preview: String = hit.chunk.text.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if hit.chunk.char_len() > PREVIEW_CHARS { "…" } else { "" };
        println!("   {}{ellipsis}\n", preview.replace('\n', " "));
    }
    Ok(())
}
