use std::io::{BufReader, BufWriter, Read, Write};

use crate::error::VecError;
use crate::flat::FlatIndex;
use crate::ivf::IvfIndex;
use crate::vecstore::VecIndex;

/// Binary snapshot magic and version.
const MAGIC: [u8; 4] = [b'W', b'V', b'E', b'C'];
const VERSION: u32 = 1;

pub(crate) const KIND_FLAT: u8 = 0;
pub(crate) const KIND_IVF: u8 = 1;

/// Load deserializes an index written by [`VecIndex::save`].
///
/// ```text
/// [4B magic "WVEC"] [4B version=1] [1B kind] [4B dim] [8B count]
/// kind=0 (flat):
///   [count x dim x 4B float32 vectors]
/// kind=1 (ivf):
///   [4B nlist] [4B nprobe] [4B numCentroids]
///   [numCentroids x dim x 4B float32 centroids]
///   [count x dim x 4B float32 vectors]
/// ```
///
/// All multi-byte values are little-endian. Inverted lists are not stored;
/// they are rebuilt from the vectors and centroids.
pub fn load(r: &mut dyn Read) -> Result<Box<dyn VecIndex>, VecError> {
    let mut dec = Decoder::new(r);

    let mut magic = [0u8; 4];
    dec.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(VecError::InvalidFormat(format!("invalid magic {magic:?}")));
    }

    let version = dec.u32()?;
    if version != VERSION {
        return Err(VecError::InvalidFormat(format!(
            "unsupported version {version} (want {VERSION})"
        )));
    }

    let kind = dec.u8()?;
    let dim = dec.u32()? as usize;
    if dim == 0 {
        return Err(VecError::InvalidFormat("invalid dimension 0".into()));
    }
    let count = dec.u64()? as usize;

    match kind {
        KIND_FLAT => Ok(Box::new(FlatIndex::decode(&mut dec, dim, count)?)),
        KIND_IVF => Ok(Box::new(IvfIndex::decode(&mut dec, dim, count)?)),
        other => Err(VecError::InvalidFormat(format!("unknown index kind {other}"))),
    }
}

/// Number of floats in `rows` vectors of `dim`, rejecting sizes that
/// cannot be addressed.
pub(crate) fn float_count(rows: usize, dim: usize) -> Result<usize, VecError> {
    rows.checked_mul(dim)
        .ok_or_else(|| VecError::InvalidFormat(format!("{rows} vectors of dimension {dim} overflow")))
}

fn io_err(e: std::io::Error) -> VecError {
    VecError::Io(e.to_string())
}

/// Little-endian writer shared by the index implementations.
pub(crate) struct Encoder<'a> {
    w: BufWriter<&'a mut dyn Write>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(w: &'a mut dyn Write) -> Self {
        Self {
            w: BufWriter::new(w),
        }
    }

    pub(crate) fn header(&mut self, kind: u8, dim: usize, count: usize) -> Result<(), VecError> {
        self.w.write_all(&MAGIC).map_err(io_err)?;
        self.u32(VERSION)?;
        self.u8(kind)?;
        self.u32(dim as u32)?;
        self.u64(count as u64)
    }

    pub(crate) fn u8(&mut self, v: u8) -> Result<(), VecError> {
        self.w.write_all(&[v]).map_err(io_err)
    }

    pub(crate) fn u32(&mut self, v: u32) -> Result<(), VecError> {
        self.w.write_all(&v.to_le_bytes()).map_err(io_err)
    }

    pub(crate) fn u64(&mut self, v: u64) -> Result<(), VecError> {
        self.w.write_all(&v.to_le_bytes()).map_err(io_err)
    }

    pub(crate) fn f32s(&mut self, vs: &[f32]) -> Result<(), VecError> {
        for &v in vs {
            self.w.write_all(&v.to_le_bytes()).map_err(io_err)?;
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<(), VecError> {
        self.w.flush().map_err(io_err)
    }
}

/// Little-endian reader shared by the index implementations.
pub(crate) struct Decoder<'a> {
    r: BufReader<&'a mut dyn Read>,
}

impl<'a> Decoder<'a> {
    fn new(r: &'a mut dyn Read) -> Self {
        Self {
            r: BufReader::new(r),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), VecError> {
        self.r.read_exact(buf).map_err(io_err)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, VecError> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32, VecError> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, VecError> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    /// Reads `n` float32 values.
    pub(crate) fn f32s(&mut self, n: usize) -> Result<Vec<f32>, VecError> {
        // Grow as data arrives instead of trusting `n` for the allocation.
        let mut out = Vec::with_capacity(n.min(1 << 20));
        let mut b = [0u8; 4];
        for _ in 0..n {
            self.read_exact(&mut b)?;
            out.push(f32::from_le_bytes(b));
        }
        Ok(out)
    }
}
