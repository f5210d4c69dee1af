//! RPC error type and HTTP mapping.
//!
//! Every ledger rejection surfaces as a stable machine-readable error code
//! plus a human-readable message, so clients can branch on cause without
//! parsing message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use peerlend_ledger::{LedgerError, TransferError};
use peerlend_node::ServiceError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("request {0} not found")]
    RequestNotFound(u64),

    #[error("loan {0} not found")]
    LoanNotFound(u64),

    #[error("invalid account id: {0}")]
    InvalidAccount(#[from] peerlend_types::AccountIdError),
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl RpcError {
    /// Stable error code for client branching.
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::RequestNotFound(_) => "request_not_found",
            RpcError::LoanNotFound(_) => "loan_not_found",
            RpcError::InvalidAccount(_) => "invalid_account",
            RpcError::Service(ServiceError::Ledger(e)) => match e {
                LedgerError::InvalidAmount => "invalid_amount",
                LedgerError::InvalidDuration => "invalid_duration",
                LedgerError::InsufficientCollateral { .. } => "insufficient_collateral",
                LedgerError::RequestNotFound(_) => "request_not_found",
                LedgerError::RequestNotActive(_) => "request_not_active",
                LedgerError::AmountMismatch { .. } => "amount_mismatch",
                LedgerError::LoanNotFound(_) => "loan_not_found",
                LedgerError::NotBorrower(_) => "not_borrower",
                LedgerError::AlreadyRepaid(_) => "already_repaid",
                LedgerError::InsufficientRepayment { .. } => "insufficient_repayment",
                LedgerError::NotExpired { .. } => "not_expired",
                LedgerError::Overflow => "overflow",
                LedgerError::Transfer(TransferError::InsufficientFunds { .. }) => {
                    "insufficient_funds"
                }
                LedgerError::Transfer(TransferError::BalanceOverflow { .. }) => "overflow",
            },
            RpcError::Service(ServiceError::FaucetDisabled) => "faucet_disabled",
            RpcError::Service(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::RequestNotFound(_) | RpcError::LoanNotFound(_) => StatusCode::NOT_FOUND,
            RpcError::InvalidAccount(_) => StatusCode::BAD_REQUEST,
            RpcError::Service(ServiceError::Ledger(e)) => match e {
                LedgerError::InvalidAmount
                | LedgerError::InvalidDuration
                | LedgerError::InsufficientCollateral { .. }
                | LedgerError::AmountMismatch { .. }
                | LedgerError::InsufficientRepayment { .. } => StatusCode::BAD_REQUEST,
                LedgerError::RequestNotFound(_) | LedgerError::LoanNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::NotBorrower(_) => StatusCode::FORBIDDEN,
                LedgerError::RequestNotActive(_)
                | LedgerError::AlreadyRepaid(_)
                | LedgerError::NotExpired { .. } => StatusCode::CONFLICT,
                LedgerError::Transfer(TransferError::InsufficientFunds { .. }) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                LedgerError::Overflow
                | LedgerError::Transfer(TransferError::BalanceOverflow { .. }) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            RpcError::Service(ServiceError::FaucetDisabled) => StatusCode::FORBIDDEN,
            RpcError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
