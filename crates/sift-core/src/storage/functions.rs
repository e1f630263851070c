//! Vector operators as SQLite scalar functions
//!
//! Registered on every connection:
//! - `cosine_distance(a BLOB, b BLOB)`: pgvector `<=>`
//! - `sparse_neg_inner_product(a TEXT, b TEXT)`: pgvector `<#>` on sparsevec,
//!   the negated dot product, so smaller means more relevant
//!
//! NULL in either argument yields NULL.

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

use crate::embeddings::{cosine_distance, parse_sparse, DenseVector};

/// SQL name of the dense distance operator
pub const COSINE_DISTANCE_FN: &str = "cosine_distance";

/// SQL name of the sparse inner-product operator
pub const SPARSE_NEG_INNER_PRODUCT_FN: &str = "sparse_neg_inner_product";

fn user_error(message: String) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(message.into())
}

fn dense_arg(ctx: &Context<'_>, idx: usize) -> rusqlite::Result<Option<DenseVector>> {
    let Some(bytes) = ctx.get::<Option<Vec<u8>>>(idx)? else {
        return Ok(None);
    };
    DenseVector::from_bytes(&bytes)
        .map(Some)
        .ok_or_else(|| user_error(format!("{}: argument {} is not a packed f32 array", COSINE_DISTANCE_FN, idx)))
}

/// Register both operators on a connection
pub fn register_vector_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(COSINE_DISTANCE_FN, 2, flags, |ctx| {
        let (Some(a), Some(b)) = (dense_arg(ctx, 0)?, dense_arg(ctx, 1)?) else {
            return Ok(None);
        };
        if a.dimensions() != b.dimensions() {
            return Err(user_error(format!(
                "different vector dimensions {} and {}",
                a.dimensions(),
                b.dimensions()
            )));
        }
        Ok(Some(cosine_distance(a.as_slice(), b.as_slice()) as f64))
    })?;

    conn.create_scalar_function(SPARSE_NEG_INNER_PRODUCT_FN, 2, flags, |ctx| {
        let (Some(a), Some(b)) = (ctx.get::<Option<String>>(0)?, ctx.get::<Option<String>>(1)?)
        else {
            return Ok(None);
        };
        let (a, a_dims) = parse_sparse(&a).map_err(|e| user_error(e.to_string()))?;
        let (b, b_dims) = parse_sparse(&b).map_err(|e| user_error(e.to_string()))?;
        if a_dims != b_dims {
            return Err(user_error(format!(
                "different sparsevec dimensions {} and {}",
                a_dims, b_dims
            )));
        }
        Ok(Some(-(a.dot(&b) as f64)))
    })?;

    Ok(())
}
