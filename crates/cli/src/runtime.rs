use anyhow::{Context, Result};
use kale_search::Retriever;
use kale_vector_store::{EmbeddingModel, VectorCollection};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Settings {
    pub persist_dir: PathBuf,
    pub collection: String,
    pub quiet: bool,
}

pub(crate) fn embedder() -> Result<Arc<EmbeddingModel>> {
    let model = EmbeddingModel::from_env().context("configure embedding provider")?;
    log::debug!("Embedding model: {}", model.model_id());
    Ok(Arc::new(model))
}

pub(crate) async fn open_collection(settings: &Settings) -> Result<Arc<VectorCollection>> {
    let collection = VectorCollection::open(&settings.persist_dir, &settings.collection)
        .await
        .with_context(|| {
            format!(
                "open collection '{}' in {}",
                settings.collection,
                settings.persist_dir.display()
            )
        })?;
    if collection.is_empty() {
        log::warn!(
            "Collection '{}' is empty; run `kale-assistant index <document>` first",
            settings.collection
        );
    }
    Ok(Arc::new(collection))
}

/// Retriever over the configured collection, checked against the configured model.
pub(crate) async fn retriever(settings: &Settings, timeout: Duration) -> Result<Retriever> {
    let collection = open_collection(settings).await?;
    let retriever = Retriever::new(collection, embedder()?)
        .context("collection does not match the configured embedding model")?;
    Ok(retriever.with_timeout(timeout))
}
