use crate::{IndexerError, Result};
use fs2::FileExt;
use kale_vector_store::collection_lock_file;
use std::path::Path;
use std::time::Instant;

/// Held for the duration of one indexing run; released on drop.
pub(crate) struct IndexWriteLock {
    file: std::fs::File,
}

impl Drop for IndexWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Serialize writers of one collection across processes. Readers never lock;
/// they only ever see a fully renamed collection file.
pub(crate) async fn acquire_index_write_lock(
    persist_dir: &Path,
    collection: &str,
) -> Result<IndexWriteLock> {
    let path = collection_lock_file(persist_dir, collection);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::task::spawn_blocking(move || -> Result<IndexWriteLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| {
                IndexerError::Other(format!("open index lock {}: {err}", path.display()))
            })?;

        let start = Instant::now();
        file.lock_exclusive().map_err(|err| {
            IndexerError::Other(format!("acquire index lock {}: {err}", path.display()))
        })?;
        let waited = start.elapsed();
        if waited.as_millis() > 100 {
            log::info!("Waited {waited:?} for index lock {}", path.display());
        }

        Ok(IndexWriteLock { file })
    })
    .await
    .map_err(|err| IndexerError::Other(format!("join index lock task: {err}")))?
}
