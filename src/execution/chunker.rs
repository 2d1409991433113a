//! Splits an ordered sequence into contiguous chunks for a target parallelism.

use crate::error::{PipelineError, PipelineResult};
use crate::types::Chunk;

/// Split `len` elements into at most `parallelism` contiguous chunks.
///
/// - Fails with [`PipelineError::InvalidConfiguration`] if `parallelism == 0`.
/// - Never produces an empty chunk; `len == 0` yields no chunks and `len < parallelism` yields one
///   chunk per element.
/// - Sizes differ by at most one: the first `len % n` chunks get the extra element.
/// - Chunks are returned in ascending original order, which is also the merge order.
pub fn split(len: usize, parallelism: usize) -> PipelineResult<Vec<Chunk>> {
    if parallelism == 0 {
        return Err(PipelineError::invalid_config("parallelism must be >= 1"));
    }
    let n = parallelism.min(len);
    if n == 0 {
        return Ok(Vec::new());
    }

    let base = len / n;
    let remainder = len % n;
    let mut out = Vec::with_capacity(n);
    let mut start = 0usize;
    for index in 0..n {
        let size = base + usize::from(index < remainder);
        out.push(Chunk::new(index, start, start + size));
        start += size;
    }
    debug_assert_eq!(start, len);
    Ok(out)
}
