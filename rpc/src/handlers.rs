//! RPC request handlers and wire types.
//!
//! Caller identity arrives in the request body as `account`, supplied by
//! the fronting authentication layer; deposits arrive as explicit amounts
//! debited from the caller's bank balance within the same atomic step.

use crate::error::RpcError;
use axum::extract::{Path, State};
use axum::Json;
use peerlend_ledger::{ActiveLoan, BorrowerPosition, LoanRequest};
use peerlend_node::{LedgerStats, LendingService};
use peerlend_types::{AccountId, Amount, InterestRate, LoanStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    /// Authenticated caller; becomes the borrower.
    pub account: AccountId,
    pub loan_amount: Amount,
    pub duration_days: u64,
    /// Stake deposited with the call; must be at least 2x the amount.
    pub deposit: Amount,
}

#[derive(Debug, Serialize)]
pub struct CreateRequestResponse {
    pub request_id: u64,
}

pub async fn create_request(
    State(service): State<Arc<LendingService>>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<CreateRequestResponse>, RpcError> {
    let request_id = service.create_request(
        body.account,
        body.loan_amount,
        body.duration_days,
        body.deposit,
    )?;
    Ok(Json(CreateRequestResponse { request_id }))
}

#[derive(Debug, Deserialize)]
pub struct FundRequestBody {
    /// Authenticated caller; becomes the lender.
    pub account: AccountId,
    pub interest_rate: InterestRate,
    /// Principal deposited with the call; must equal the loan amount.
    pub deposit: Amount,
}

#[derive(Debug, Serialize)]
pub struct FundRequestResponse {
    pub loan_id: u64,
}

pub async fn fund_request(
    State(service): State<Arc<LendingService>>,
    Path(request_id): Path<u64>,
    Json(body): Json<FundRequestBody>,
) -> Result<Json<FundRequestResponse>, RpcError> {
    let loan_id =
        service.fund_request(body.account, request_id, body.interest_rate, body.deposit)?;
    Ok(Json(FundRequestResponse { loan_id }))
}

pub async fn get_request(
    State(service): State<Arc<LendingService>>,
    Path(request_id): Path<u64>,
) -> Result<Json<LoanRequest>, RpcError> {
    service
        .request(request_id)?
        .map(Json)
        .ok_or(RpcError::RequestNotFound(request_id))
}

pub async fn open_requests(
    State(service): State<Arc<LendingService>>,
) -> Result<Json<Vec<LoanRequest>>, RpcError> {
    Ok(Json(service.open_requests()?))
}

// ── Loans ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RepayLoanBody {
    /// Authenticated caller; must be the loan's borrower.
    pub account: AccountId,
    /// Repayment deposited with the call; exactly principal plus interest.
    pub deposit: Amount,
}

pub async fn repay_loan(
    State(service): State<Arc<LendingService>>,
    Path(loan_id): Path<u64>,
    Json(body): Json<RepayLoanBody>,
) -> Result<Json<serde_json::Value>, RpcError> {
    service.repay_loan(body.account, loan_id, body.deposit)?;
    Ok(Json(serde_json::json!({ "loan_id": loan_id, "repaid": true })))
}

pub async fn liquidate_loan(
    State(service): State<Arc<LendingService>>,
    Path(loan_id): Path<u64>,
) -> Result<Json<serde_json::Value>, RpcError> {
    service.liquidate_expired(loan_id)?;
    Ok(Json(
        serde_json::json!({ "loan_id": loan_id, "liquidated": true }),
    ))
}

pub async fn get_loan(
    State(service): State<Arc<LendingService>>,
    Path(loan_id): Path<u64>,
) -> Result<Json<ActiveLoan>, RpcError> {
    service
        .loan(loan_id)?
        .map(Json)
        .ok_or(RpcError::LoanNotFound(loan_id))
}

#[derive(Debug, Serialize)]
pub struct LoanStatusResponse {
    pub loan_id: u64,
    pub status: LoanStatus,
}

pub async fn loan_status(
    State(service): State<Arc<LendingService>>,
    Path(loan_id): Path<u64>,
) -> Result<Json<LoanStatusResponse>, RpcError> {
    let status = service.loan_status(loan_id)?;
    Ok(Json(LoanStatusResponse { loan_id, status }))
}

pub async fn live_loans(
    State(service): State<Arc<LendingService>>,
) -> Result<Json<Vec<ActiveLoan>>, RpcError> {
    Ok(Json(service.live_loans()?))
}

// ── Accounts ─────────────────────────────────────────────────────────────

pub async fn borrower_positions(
    State(service): State<Arc<LendingService>>,
    Path(account): Path<String>,
) -> Result<Json<Vec<BorrowerPosition>>, RpcError> {
    let account: AccountId = account.parse()?;
    Ok(Json(service.borrower_positions(&account)?))
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account: AccountId,
    pub balance: Amount,
}

pub async fn balance(
    State(service): State<Arc<LendingService>>,
    Path(account): Path<String>,
) -> Result<Json<BalanceResponse>, RpcError> {
    let account: AccountId = account.parse()?;
    let balance = service.balance(&account)?;
    Ok(Json(BalanceResponse { account, balance }))
}

#[derive(Debug, Deserialize)]
pub struct FaucetBody {
    pub amount: Amount,
}

pub async fn faucet_deposit(
    State(service): State<Arc<LendingService>>,
    Path(account): Path<String>,
    Json(body): Json<FaucetBody>,
) -> Result<Json<BalanceResponse>, RpcError> {
    let account: AccountId = account.parse()?;
    service.faucet_deposit(account.clone(), body.amount)?;
    let balance = service.balance(&account)?;
    Ok(Json(BalanceResponse { account, balance }))
}

// ── Stats ────────────────────────────────────────────────────────────────

pub async fn stats(
    State(service): State<Arc<LendingService>>,
) -> Result<Json<LedgerStats>, RpcError> {
    Ok(Json(service.stats()?))
}
