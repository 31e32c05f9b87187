use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient database failure. Surfaced as-is; the store never retries.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt row {id}: bad {field}")]
    CorruptRow { id: String, field: &'static str },
}
