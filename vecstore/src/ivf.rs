use std::io::Write;

use crate::error::VecError;
use crate::io::{float_count, Decoder, Encoder, KIND_IVF};
use crate::kmeans::{nearest, spherical_kmeans};
use crate::vecstore::{rank, AddReport, Match, RejectedItem, VecIndex};
use crate::vector::{inner_product, prepare, VectorTable};

const KMEANS_ITERATIONS: usize = 20;
const KMEANS_SEED: u64 = 0x5eed;

/// Parameters of an inverted-file index.
#[derive(Debug, Clone)]
pub struct IvfConfig {
    /// Vector dimension. Required.
    pub dim: usize,

    /// Number of coarse clusters. Default: 100.
    /// Capped at the training sample size.
    pub nlist: usize,

    /// Clusters scanned per query. Default: 10.
    pub nprobe: usize,
}

impl IvfConfig {
    pub fn new(dim: usize) -> Self {
        let mut cfg = Self {
            dim,
            nlist: 0,
            nprobe: 0,
        };
        cfg.set_defaults();
        cfg
    }

    fn set_defaults(&mut self) {
        if self.nlist == 0 {
            self.nlist = 100;
        }
        if self.nprobe == 0 {
            self.nprobe = 10;
        }
    }
}

/// IvfIndex partitions vectors into clusters learned by spherical k-means
/// and scans only the `nprobe` clusters closest to the query.
///
/// Must be trained before vectors can be added. Search over an untrained
/// index returns no results.
pub struct IvfIndex {
    cfg: IvfConfig,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<u64>>,
    table: VectorTable,
}

impl IvfIndex {
    /// Create an untrained index. Zero `nlist`/`nprobe` take their
    /// defaults. Panics if `dim` is 0.
    pub fn new(mut cfg: IvfConfig) -> Self {
        assert!(cfg.dim > 0, "vecstore: IvfIndex dim must be positive");
        cfg.set_defaults();
        let table = VectorTable::new(cfg.dim);
        Self {
            cfg,
            centroids: Vec::new(),
            lists: Vec::new(),
            table,
        }
    }

    /// Changes how many clusters are scanned per query.
    pub fn set_nprobe(&mut self, nprobe: usize) {
        self.cfg.nprobe = nprobe.max(1);
    }

    /// Number of clusters learned by training (0 when untrained).
    pub fn num_lists(&self) -> usize {
        self.centroids.len()
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>, dim: usize, count: usize) -> Result<Self, VecError> {
        let nlist = dec.u32()? as usize;
        let nprobe = dec.u32()? as usize;
        let num_centroids = dec.u32()? as usize;
        if num_centroids == 0 && count > 0 {
            return Err(VecError::InvalidFormat(format!(
                "untrained ivf index holds {count} vectors"
            )));
        }

        let flat = dec.f32s(float_count(num_centroids, dim)?)?;
        let centroids: Vec<Vec<f32>> = flat.chunks_exact(dim).map(<[f32]>::to_vec).collect();
        let data = dec.f32s(float_count(count, dim)?)?;

        let mut idx = Self::new(IvfConfig { dim, nlist, nprobe });
        idx.lists = vec![Vec::new(); centroids.len()];
        idx.centroids = centroids;
        idx.table = VectorTable { dim, data };

        // Rebuild inverted lists from the stored vectors.
        for (id, v) in idx.table.rows().enumerate() {
            let list = nearest(&idx.centroids, v);
            idx.lists[list].push(id as u64);
        }
        Ok(idx)
    }
}

impl VecIndex for IvfIndex {
    fn dim(&self) -> usize {
        self.cfg.dim
    }

    fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    fn train(&mut self, samples: &[&[f32]]) -> Result<(), VecError> {
        if self.is_trained() {
            return Ok(());
        }
        let mut units = Vec::with_capacity(samples.len());
        for s in samples {
            match prepare(s, self.cfg.dim) {
                Ok(u) => units.push(u),
                Err(VecError::ZeroVector) => continue,
                Err(e) => return Err(e),
            }
        }
        if units.is_empty() {
            return Err(VecError::EmptyTrainingSet);
        }

        self.centroids = spherical_kmeans(&units, self.cfg.nlist, KMEANS_ITERATIONS, KMEANS_SEED);
        self.lists = vec![Vec::new(); self.centroids.len()];
        Ok(())
    }

    fn add(&mut self, vectors: &[&[f32]]) -> Result<AddReport, VecError> {
        if !self.is_trained() {
            return Err(VecError::NotTrained);
        }
        let mut report = AddReport::default();
        for (position, v) in vectors.iter().enumerate() {
            match prepare(v, self.cfg.dim) {
                Ok(unit) => {
                    let list = nearest(&self.centroids, &unit);
                    let id = self.table.push(&unit);
                    self.lists[list].push(id);
                    report.ids.push(id);
                }
                Err(error) => report.rejected.push(RejectedItem { position, error }),
            }
        }
        Ok(report)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        let q = prepare(query, self.cfg.dim)?;
        if !self.is_trained() || self.table.len() == 0 || top_k == 0 {
            return Ok(vec![]);
        }

        let mut probes: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, inner_product(&q, c)))
            .collect();
        probes.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        probes.truncate(self.cfg.nprobe.max(1));

        let mut scored = Vec::new();
        for (list, _) in probes {
            for &id in &self.lists[list] {
                scored.push((id, inner_product(&q, self.table.row(id))));
            }
        }
        Ok(rank(scored, top_k))
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn save(&self, w: &mut dyn Write) -> Result<(), VecError> {
        let mut enc = Encoder::new(w);
        enc.header(KIND_IVF, self.cfg.dim, self.table.len())?;
        enc.u32(self.cfg.nlist as u32)?;
        enc.u32(self.cfg.nprobe as u32)?;
        enc.u32(self.centroids.len() as u32)?;
        for c in &self.centroids {
            enc.f32s(c)?;
        }
        enc.f32s(&self.table.data)?;
        enc.finish()
    }
}
