use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressError {
    #[error("Output buffer too small for the compressed stream")]
    OutputTooSmall,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    #[error("Compressed stream truncated at input byte {consumed}")]
    Truncated { consumed: usize },

    #[error("Match offset at input byte {consumed} points outside the output written so far")]
    InvalidOffset { consumed: usize },

    #[error("Malformed sequence at input byte {consumed}")]
    MalformedSequence { consumed: usize },
}

impl DecompressError {
    /// Number of input bytes consumed before the violation was detected.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        match self {
            Self::Truncated { consumed }
            | Self::InvalidOffset { consumed }
            | Self::MalformedSequence { consumed } => *consumed,
        }
    }
}
