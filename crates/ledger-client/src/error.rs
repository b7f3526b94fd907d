use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid contract address: {0}")]
    InvalidContract(String),
    #[error("Ledger transport error: {0}")]
    Transport(String),
    #[error("Ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Failed to decode ledger response: {0}")]
    Decode(String),
    #[error("Ledger value out of range: {0}")]
    OutOfRange(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
