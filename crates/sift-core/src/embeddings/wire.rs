//! Sparse vector wire format: `{id:weight,...}/vocab_size`
//!
//! Ids are written in ascending order. Weights use the shortest
//! representation that round-trips, so `2.0` is written `2`.

use std::fmt::Write;

use super::{EmbeddingError, SparseVector};

/// Serialize a sparse vector for the storage layer
///
/// An empty vector still carries the `/vocab_size` suffix.
pub fn format_sparse(vector: &SparseVector, vocab_size: usize) -> String {
    let mut out = String::with_capacity(vector.len() * 8 + 8);
    out.push('{');
    for (i, (id, weight)) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{}:{}", id, weight);
    }
    let _ = write!(out, "}}/{}", vocab_size);
    out
}

/// Parse the wire format back into a vector and its dimension
pub fn parse_sparse(input: &str) -> Result<(SparseVector, usize), EmbeddingError> {
    let invalid = |reason: &str| {
        EmbeddingError::InvalidInput(format!("Malformed sparse vector '{}': {}", input, reason))
    };

    let (body, dims) = input
        .trim()
        .rsplit_once('/')
        .ok_or_else(|| invalid("missing '/dimensions' suffix"))?;
    let dims: usize = dims
        .trim()
        .parse()
        .map_err(|_| invalid("dimensions is not an integer"))?;
    let body = body
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .ok_or_else(|| invalid("missing braces"))?;

    let mut entries = Vec::new();
    for pair in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (id, weight) = pair.split_once(':').ok_or_else(|| invalid("expected id:weight"))?;
        let id: u32 = id.trim().parse().map_err(|_| invalid("token id is not an integer"))?;
        let weight: f32 = weight.trim().parse().map_err(|_| invalid("weight is not a number"))?;
        if id as usize >= dims {
            return Err(invalid("token id outside dimensions"));
        }
        entries.push((id, weight));
    }

    Ok((SparseVector::from_entries(entries), dims))
}
