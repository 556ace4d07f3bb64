//! bcrypt password hashing
//!
//! bcrypt is deliberately slow, so both directions run on the blocking pool.

use crate::error::{FeedbackError, Result};

pub async fn hash_password(plain: &str, cost: u32) -> Result<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| FeedbackError::Hashing(format!("Hashing task failed: {}", e)))?
        .map_err(Into::into)
}

/// Check `plain` against a stored hash; a malformed hash is an error, not a mismatch
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| FeedbackError::Hashing(format!("Verification task failed: {}", e)))?
        .map_err(Into::into)
}
