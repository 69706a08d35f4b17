/// Errors from message encoding and fixed-size frame decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// A fixed-size frame was shorter than its declared size.
    #[error("truncated frame ({have} bytes, need {need})")]
    Truncated { have: usize, need: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
