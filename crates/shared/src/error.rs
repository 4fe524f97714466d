use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must not be empty")]
    Empty,
    #[error("unknown palette color '{0}' (expected off, white, pink, mint or sky)")]
    UnknownName(String),
    #[error("invalid rgb triple '{0}': expected three comma separated values 0-255")]
    InvalidTriple(String),
    #[error("invalid hex color '{0}': expected #rrggbb")]
    InvalidHex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelBufferError {
    #[error("pixel buffer needs exactly {expected} pixels, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}
