use std::path::{Path, PathBuf};

pub const DEFAULT_PERSIST_DIR: &str = "vector_db";
pub const DEFAULT_COLLECTION: &str = "pykale_xml";

pub const COLLECTION_FILE_NAME: &str = "collection.json";
pub const COLLECTION_LOCK_NAME: &str = "collection.lock";

#[must_use]
pub fn collection_dir(persist_dir: &Path, collection: &str) -> PathBuf {
    persist_dir.join(collection)
}

#[must_use]
pub fn collection_file(persist_dir: &Path, collection: &str) -> PathBuf {
    collection_dir(persist_dir, collection).join(COLLECTION_FILE_NAME)
}

#[must_use]
pub fn collection_lock_file(persist_dir: &Path, collection: &str) -> PathBuf {
    collection_dir(persist_dir, collection).join(COLLECTION_LOCK_NAME)
}

/// Collection names become directory names, so keep them to a safe alphabet.
pub fn validate_collection_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("collection name must not be empty".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        || name.starts_with('.')
    {
        return Err(format!("invalid collection name '{name}'"));
    }
    Ok(())
}
