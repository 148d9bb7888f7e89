use crate::error::{Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::paths::{collection_file, validate_collection_name};
use crate::types::{SearchResult, VectorRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const COLLECTION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedCollection {
    schema_version: u32,
    name: String,
    #[serde(default)]
    model_id: Option<String>,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    records: Vec<VectorRecord>,
}

/// A named, persisted set of embedded chunks.
///
/// Records keep insertion order; it is the tie-break order for equal scores.
#[derive(Debug, Clone)]
pub struct VectorCollection {
    name: String,
    path: PathBuf,
    model_id: Option<String>,
    dimension: Option<usize>,
    records: Vec<VectorRecord>,
    positions: HashMap<String, usize>,
}

impl VectorCollection {
    /// Open `<persist_dir>/<name>/collection.json`. A missing file yields an empty
    /// collection; retrieval against it returns nothing.
    pub async fn open(persist_dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        validate_collection_name(name).map_err(VectorStoreError::InvalidConfig)?;
        let path = collection_file(persist_dir.as_ref(), name);

        if !path.exists() {
            log::warn!(
                "Collection '{name}' not found at {}; starting empty",
                path.display()
            );
            return Ok(Self::empty(name, path));
        }

        log::info!("Loading collection '{name}' from {}", path.display());
        let data = tokio::fs::read_to_string(&path).await?;
        let persisted: PersistedCollection = serde_json::from_str(&data)?;
        if persisted.schema_version != COLLECTION_SCHEMA_VERSION {
            return Err(VectorStoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: COLLECTION_SCHEMA_VERSION,
            });
        }

        let mut collection = Self::empty(name, path);
        collection.model_id = persisted.model_id;
        collection.dimension = persisted.dimension;
        for record in persisted.records {
            check_dimension(collection.dimension, record.dimension())?;
            collection.dimension = Some(record.dimension());
            collection.insert(record);
        }

        log::info!("Loaded {} records", collection.len());
        Ok(collection)
    }

    fn empty(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path,
            model_id: None,
            dimension: None,
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[VectorRecord] {
        &self.records
    }

    /// Fail when the collection was built with a different embedding model.
    pub fn check_model(&self, model_id: &str) -> Result<()> {
        match &self.model_id {
            Some(stored) if stored != model_id => Err(VectorStoreError::ModelMismatch {
                stored: stored.clone(),
                configured: model_id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Record which model builds this collection. First writer wins.
    pub fn bind_model(&mut self, model_id: &str) -> Result<()> {
        self.check_model(model_id)?;
        if self.model_id.is_none() {
            self.model_id = Some(model_id.to_string());
        }
        Ok(())
    }

    fn insert(&mut self, record: VectorRecord) {
        if let Some(&pos) = self.positions.get(&record.id) {
            self.records[pos] = record;
        } else {
            self.positions.insert(record.id.clone(), self.records.len());
            self.records.push(record);
        }
    }

    /// Insert or replace records by id. All records must share the collection dimension.
    pub fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<usize> {
        let mut dimension = self.dimension;
        for record in &records {
            check_dimension(dimension, record.dimension())?;
            dimension = Some(record.dimension());
        }
        self.dimension = dimension;
        let count = records.len();
        for record in records {
            self.insert(record);
        }
        Ok(count)
    }

    /// Drop every record and the model binding.
    pub fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.model_id = None;
        self.dimension = None;
    }

    /// Top-`k` records by cosine similarity, best first.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        if k == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }

        let mut index = FlatIndex::new(dimension);
        for record in &self.records {
            index.add(&record.embedding)?;
        }

        let hits = index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|(pos, score)| {
                let record = &self.records[pos];
                SearchResult {
                    chunk: record.chunk.clone(),
                    score,
                    id: record.id.clone(),
                }
            })
            .collect())
    }

    /// Persist atomically: write a sibling temp file, then rename over the target.
    pub async fn save(&self) -> Result<()> {
        log::info!("Saving collection '{}' to {}", self.name, self.path.display());
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let persisted = PersistedCollection {
            schema_version: COLLECTION_SCHEMA_VERSION,
            name: self.name.clone(),
            model_id: self.model_id.clone(),
            dimension: self.dimension,
            records: self.records.clone(),
        };
        let data = serde_json::to_vec(&persisted)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::info!("Collection saved ({} records)", self.records.len());
        Ok(())
    }
}

fn check_dimension(bound: Option<usize>, actual: usize) -> Result<()> {
    match bound {
        Some(expected) if expected != actual => {
            Err(VectorStoreError::InvalidDimension { expected, actual })
        }
        _ if actual == 0 => Err(VectorStoreError::InvalidDimension {
            expected: bound.unwrap_or(1),
            actual,
        }),
        _ => Ok(()),
    }
}
