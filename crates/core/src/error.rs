/// Errors raised while loading or validating a card catalog.
///
/// Catalog problems are fatal at startup (the server refuses to boot on a
/// malformed deck), so this type never crosses a request boundary.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog validation failed: {0}")]
    Validation(String),
}
