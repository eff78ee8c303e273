//! Fixed-size, order-preserving keyword batching.

use semscout_shared::{Result, SemScoutError};

/// Split `keywords` into consecutive batches of at most `size` keywords.
///
/// Order is preserved both across and within batches; the final batch may be
/// shorter. An empty input yields zero batches. A size of zero is a
/// configuration error and fails before any batch is produced.
pub fn split(keywords: &[String], size: usize) -> Result<Vec<Vec<String>>> {
    if size == 0 {
        return Err(SemScoutError::config("batch size must be at least 1"));
    }

    Ok(keywords.chunks(size).map(|chunk| chunk.to_vec()).collect())
}
