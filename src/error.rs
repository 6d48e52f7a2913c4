use thiserror::Error;

/// Failures an analysis can surface to its caller.
///
/// "No code" and "no creation trace" are not errors: they produce a valid,
/// lower-information verdict instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid Ethereum address: '{0}'")]
    InvalidAddress(String),
    #[error("trace_block for block {block} failed after {attempts} attempts: {reason}")]
    TraceUnavailable {
        block: u64,
        attempts: usize,
        reason: eyre::Report,
    },
    #[error("RPC failure: {0}")]
    Rpc(eyre::Report),
}

impl From<eyre::Report> for Error {
    fn from(value: eyre::Report) -> Self {
        Self::Rpc(value)
    }
}

impl Error {
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Error::InvalidAddress(_))
    }
}
