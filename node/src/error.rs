use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("ledger error: {0}")]
    Ledger(#[from] peerlend_ledger::LedgerError),

    #[error("config error: {0}")]
    Config(String),

    #[error("faucet is disabled")]
    FaucetDisabled,

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
