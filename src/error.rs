use thiserror::Error;

/// Reasons a circular body yields no usable row
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("circular has no GRB identifier")]
    MissingId,

    #[error("circular {0} has no GMT date line")]
    MissingDate(String),
}
