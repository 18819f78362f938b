use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuadtreeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("split policy returned {split} for {len} elements (capacity {capacity})")]
    PolicyContractViolation {
        split: usize,
        len: usize,
        capacity: usize,
    },

    #[error("node at max depth {max_depth} overflowed")]
    MaxDepthExceeded { max_depth: u8 },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing field {index}")]
    MissingField { index: usize },

    #[error("field {index} is not a number: {value:?}")]
    InvalidNumber { index: usize, value: String },

    #[error("star position does not project onto a cube face")]
    Projection,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
