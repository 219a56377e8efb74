use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wardrobe_vecstore::{AddReport, RejectedItem, VecError, VecIndex};

use crate::error::CatalogError;
use crate::rerank::{RerankQuery, ReRanker};
use crate::types::{IndexConfig, ItemMetadata, QueryResult, SearchConfig};

/// File locations of a catalog snapshot written under one base path.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPaths {
    /// Binary vector index: `<base>.index`.
    pub index: PathBuf,
    /// Metadata list and trained flag: `<base>.meta.json`.
    pub metadata: PathBuf,
}

impl SnapshotPaths {
    pub fn new(base: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut s = OsString::from(base.as_os_str());
            s.push(suffix);
            PathBuf::from(s)
        };
        Self {
            index: with_suffix(".index"),
            metadata: with_suffix(".meta.json"),
        }
    }

    pub fn exist(&self) -> bool {
        self.index.is_file() && self.metadata.is_file()
    }
}

#[derive(Deserialize)]
struct MetadataFile {
    trained: bool,
    items: Vec<ItemMetadata>,
}

#[derive(Serialize)]
struct MetadataFileRef<'a> {
    trained: bool,
    items: &'a [ItemMetadata],
}

struct CatalogInner {
    index: Box<dyn VecIndex>,
    /// `items[id]` describes the vector with index id `id`.
    items: Vec<ItemMetadata>,
}

impl CatalogInner {
    fn train(&mut self, samples: &[&[f32]]) -> Result<(), CatalogError> {
        if self.index.is_trained() {
            return Ok(());
        }
        self.index.train(samples)?;
        info!(
            samples = samples.len(),
            dim = self.index.dim(),
            "catalog: index trained"
        );
        Ok(())
    }

    fn add(
        &mut self,
        embeddings: &[&[f32]],
        items: Vec<ItemMetadata>,
    ) -> Result<AddReport, CatalogError> {
        if embeddings.len() != items.len() {
            return Err(CatalogError::BatchLengthMismatch {
                embeddings: embeddings.len(),
                items: items.len(),
            });
        }

        let report = self.index.add(embeddings)?;
        let rejected: HashSet<usize> = report.rejected.iter().map(|r| r.position).collect();
        let mut ids = report.ids.iter();
        for (position, mut item) in items.into_iter().enumerate() {
            if rejected.contains(&position) {
                continue;
            }
            if let Some(&id) = ids.next() {
                item.id = id;
                self.items.push(item);
            }
        }
        debug_assert_eq!(self.items.len(), self.index.len());

        for r in &report.rejected {
            warn!(position = r.position, error = %r.error, "catalog: item rejected");
        }
        debug!(
            accepted = report.accepted(),
            rejected = report.rejected.len(),
            total = self.items.len(),
            "catalog: batch added"
        );
        Ok(report)
    }

    fn ingest(
        &mut self,
        embeddings: &[&[f32]],
        items: Vec<ItemMetadata>,
    ) -> Result<AddReport, CatalogError> {
        if embeddings.len() != items.len() {
            return Err(CatalogError::BatchLengthMismatch {
                embeddings: embeddings.len(),
                items: items.len(),
            });
        }
        if !self.index.is_trained() {
            let dim = self.index.dim();
            let samples: Vec<&[f32]> = embeddings
                .iter()
                .copied()
                .filter(|e| e.len() == dim)
                .collect();
            match self.train(&samples) {
                Ok(()) => {}
                Err(CatalogError::Vector(VecError::EmptyTrainingSet)) => {
                    // Nothing in the batch is usable as a sample.
                    let report = reject_all(embeddings, dim);
                    for r in &report.rejected {
                        warn!(position = r.position, error = %r.error, "catalog: item rejected");
                    }
                    return Ok(report);
                }
                Err(e) => return Err(e),
            }
        }
        self.add(embeddings, items)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>, CatalogError> {
        let matches = self.index.search(query, k)?;
        Ok(matches
            .into_iter()
            .filter_map(|m| {
                self.items
                    .get(m.id as usize)
                    .map(|item| QueryResult::new(item.clone(), m.score))
            })
            .collect())
    }
}

fn reject_all(embeddings: &[&[f32]], dim: usize) -> AddReport {
    let rejected = embeddings
        .iter()
        .enumerate()
        .map(|(position, e)| RejectedItem {
            position,
            error: if e.len() != dim {
                VecError::DimensionMismatch { got: e.len(), want: dim }
            } else {
                VecError::ZeroVector
            },
        })
        .collect();
    AddReport {
        ids: Vec::new(),
        rejected,
    }
}

/// Catalog is the process-wide similarity index over library items.
///
/// Thread-safe: searches and saves share a read lock; training,
/// insertion and loading take the write lock. The index and the
/// metadata list live under the same lock and always have equal length.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    /// Creates an empty catalog. Panics if `cfg.dim` is 0.
    pub fn new(cfg: &IndexConfig) -> Self {
        Self::with_index(cfg.build())
    }

    /// Wraps an index that holds no vectors yet.
    pub fn with_index(index: Box<dyn VecIndex>) -> Self {
        assert!(index.is_empty(), "catalog: index must be empty");
        Self {
            inner: RwLock::new(CatalogInner {
                index,
                items: Vec::new(),
            }),
        }
    }

    /// Loads the snapshot at `base` if both files exist, otherwise
    /// creates an empty catalog from `cfg`.
    pub fn open(cfg: &IndexConfig, base: &Path) -> Result<Self, CatalogError> {
        let catalog = Self::new(cfg);
        if SnapshotPaths::new(base).exist() {
            catalog.load(base)?;
        } else {
            info!(base = %base.display(), "catalog: no snapshot, starting empty");
        }
        Ok(catalog)
    }

    pub fn dim(&self) -> usize {
        self.inner.read().index.dim()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().index.is_trained()
    }

    /// Returns a copy of the metadata stored under `id`.
    pub fn item(&self, id: u64) -> Option<ItemMetadata> {
        self.inner.read().items.get(id as usize).cloned()
    }

    /// Trains the index on a sample. No-op if already trained.
    pub fn train(&self, samples: &[&[f32]]) -> Result<(), CatalogError> {
        self.inner.write().train(samples)
    }

    /// Appends a batch. `embeddings` and `items` must have equal length.
    ///
    /// Items with a wrong dimension or a zero vector are skipped and
    /// listed in the report; the rest are stored with ids assigned in
    /// batch order. Fails with [`VecError::NotTrained`] when the index
    /// needs training first.
    pub fn add(
        &self,
        embeddings: &[&[f32]],
        items: Vec<ItemMetadata>,
    ) -> Result<AddReport, CatalogError> {
        self.inner.write().add(embeddings, items)
    }

    /// Like [`Catalog::add`], but trains an untrained index on this batch
    /// first.
    pub fn ingest(
        &self,
        embeddings: &[&[f32]],
        items: Vec<ItemMetadata>,
    ) -> Result<AddReport, CatalogError> {
        self.inner.write().ingest(embeddings, items)
    }

    /// Adds one item, training on it if the index is untrained.
    /// Returns the assigned id.
    pub fn add_item(&self, embedding: &[f32], item: ItemMetadata) -> Result<u64, CatalogError> {
        let mut report = self.inner.write().ingest(&[embedding], vec![item])?;
        match report.ids.first() {
            Some(&id) => Ok(id),
            None => match report.rejected.pop() {
                Some(r) => Err(r.error.into()),
                None => Err(VecError::NotTrained.into()),
            },
        }
    }

    /// Returns up to `k` items by descending cosine similarity, with
    /// `similarity == base_score`. Empty when the index is untrained or
    /// empty.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>, CatalogError> {
        self.inner.read().search(query, k)
    }

    /// Fetches `k * multiplier` candidates (capped at the entry count) for
    /// downstream re-ranking.
    pub fn search_candidates(
        &self,
        query: &[f32],
        k: usize,
        multiplier: usize,
    ) -> Result<Vec<QueryResult>, CatalogError> {
        let inner = self.inner.read();
        let n = k.saturating_mul(multiplier.max(1)).min(inner.items.len());
        inner.search(query, n)
    }

    /// Returns `search.top_k` items for a garment embedding.
    ///
    /// With garment attributes, over-fetches candidates and re-ranks them;
    /// without, returns the plain nearest neighbors.
    pub fn find_similar(
        &self,
        query: &[f32],
        garment: Option<&RerankQuery>,
        search: &SearchConfig,
    ) -> Result<Vec<QueryResult>, CatalogError> {
        match garment.filter(|g| !g.is_empty()) {
            None => self.search(query, search.top_k),
            Some(g) => {
                let candidates =
                    self.search_candidates(query, search.top_k, search.candidate_multiplier)?;
                let ranker = ReRanker::new(search.rerank.clone());
                Ok(ranker.rerank(candidates, g, search.top_k))
            }
        }
    }

    /// Writes `<base>.index` and `<base>.meta.json`.
    pub fn save(&self, base: &Path) -> Result<(), CatalogError> {
        let paths = SnapshotPaths::new(base);
        if let Some(dir) = paths.index.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let inner = self.inner.read();

        let mut w = BufWriter::new(File::create(&paths.index)?);
        inner.index.save(&mut w)?;
        w.flush()?;

        let mut w = BufWriter::new(File::create(&paths.metadata)?);
        serde_json::to_writer_pretty(
            &mut w,
            &MetadataFileRef {
                trained: inner.index.is_trained(),
                items: &inner.items,
            },
        )?;
        w.flush()?;

        info!(
            base = %base.display(),
            items = inner.items.len(),
            "catalog: snapshot saved"
        );
        Ok(())
    }

    /// Replaces the catalog contents with the snapshot at `base`.
    ///
    /// Fails with [`CatalogError::Corrupt`] if the index and metadata
    /// counts differ; the current contents are kept in that case.
    pub fn load(&self, base: &Path) -> Result<(), CatalogError> {
        let paths = SnapshotPaths::new(base);

        let mut r = BufReader::new(File::open(&paths.index)?);
        let index = wardrobe_vecstore::load(&mut r)?;

        let meta: MetadataFile =
            serde_json::from_reader(BufReader::new(File::open(&paths.metadata)?))?;

        if index.len() != meta.items.len() {
            return Err(CatalogError::Corrupt {
                index: index.len(),
                metadata: meta.items.len(),
            });
        }
        if index.is_trained() != meta.trained {
            warn!(
                index = index.is_trained(),
                metadata = meta.trained,
                "catalog: trained flag disagrees with index, using index"
            );
        }

        let mut items = meta.items;
        for (id, item) in items.iter_mut().enumerate() {
            item.id = id as u64;
        }

        let mut inner = self.inner.write();
        inner.index = index;
        inner.items = items;
        info!(
            base = %base.display(),
            items = inner.items.len(),
            trained = inner.index.is_trained(),
            "catalog: snapshot loaded"
        );
        Ok(())
    }
}
