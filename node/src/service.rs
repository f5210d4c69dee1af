//! The lending service — single-writer access to the ledger and bank.
//!
//! Every mutating operation takes the write lock for its whole duration, so
//! mutations are totally ordered and each one sees and leaves a consistent
//! ledger/bank pair. Read-only queries share the read lock and observe a
//! consistent snapshot.

use crate::clock::Clock;
use crate::error::ServiceError;
use peerlend_ledger::{
    ActiveLoan, BorrowerPosition, LoanLedger, LoanRequest, MemoryBank,
};
use peerlend_types::{AccountId, Amount, InterestRate, LoanId, LoanStatus, RequestId};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Running counters and custody total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_requests: u64,
    pub total_loans: u64,
    pub custody_balance: Amount,
}

struct State {
    ledger: LoanLedger,
    bank: MemoryBank,
}

/// Serialized front door to the loan ledger.
pub struct LendingService {
    state: RwLock<State>,
    clock: Box<dyn Clock>,
    faucet_enabled: bool,
}

impl LendingService {
    pub fn new(bank: MemoryBank, clock: Box<dyn Clock>, faucet_enabled: bool) -> Self {
        Self {
            state: RwLock::new(State {
                ledger: LoanLedger::new(),
                bank,
            }),
            clock,
            faucet_enabled,
        }
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, ServiceError> {
        self.state.write().map_err(|_| ServiceError::LockPoisoned)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, ServiceError> {
        self.state.read().map_err(|_| ServiceError::LockPoisoned)
    }

    // ── Mutations ──────────────────────────────────────────────────────

    pub fn create_request(
        &self,
        borrower: AccountId,
        loan_amount: Amount,
        duration_days: u64,
        deposit: Amount,
    ) -> Result<RequestId, ServiceError> {
        let mut state = self.write()?;
        let State { ledger, bank } = &mut *state;
        let id = ledger.create_request(
            borrower.clone(),
            loan_amount,
            duration_days,
            deposit,
            bank,
        )?;
        tracing::info!(%borrower, request_id = id, %loan_amount, %deposit, "loan request created");
        Ok(id)
    }

    pub fn fund_request(
        &self,
        lender: AccountId,
        request_id: RequestId,
        interest_rate: InterestRate,
        deposit: Amount,
    ) -> Result<LoanId, ServiceError> {
        let now = self.clock.now();
        let mut state = self.write()?;
        let State { ledger, bank } = &mut *state;
        let loan_id =
            ledger.fund_request(lender.clone(), request_id, interest_rate, deposit, now, bank)?;
        tracing::info!(%lender, loan_id, %interest_rate, "loan request funded");
        Ok(loan_id)
    }

    pub fn repay_loan(
        &self,
        caller: AccountId,
        loan_id: LoanId,
        deposit: Amount,
    ) -> Result<(), ServiceError> {
        let mut state = self.write()?;
        let State { ledger, bank } = &mut *state;
        ledger.repay_loan(caller.clone(), loan_id, deposit, bank)?;
        tracing::info!(%caller, loan_id, %deposit, "loan repaid");
        Ok(())
    }

    pub fn liquidate_expired(&self, loan_id: LoanId) -> Result<(), ServiceError> {
        let now = self.clock.now();
        let mut state = self.write()?;
        let State { ledger, bank } = &mut *state;
        ledger.liquidate_expired(loan_id, now, bank)?;
        tracing::info!(loan_id, "expired loan liquidated");
        Ok(())
    }

    /// Credit an account out of thin air. Dev deployments only; rejected
    /// unless the faucet is enabled in config.
    pub fn faucet_deposit(&self, account: AccountId, amount: Amount) -> Result<(), ServiceError> {
        if !self.faucet_enabled {
            return Err(ServiceError::FaucetDisabled);
        }
        let mut state = self.write()?;
        state.bank.deposit(account.clone(), amount);
        tracing::info!(%account, %amount, "faucet deposit");
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn request(&self, id: RequestId) -> Result<Option<LoanRequest>, ServiceError> {
        Ok(self.read()?.ledger.request(id).cloned())
    }

    pub fn loan(&self, id: LoanId) -> Result<Option<ActiveLoan>, ServiceError> {
        Ok(self.read()?.ledger.loan(id).cloned())
    }

    pub fn loan_status(&self, id: LoanId) -> Result<LoanStatus, ServiceError> {
        let now = self.clock.now();
        Ok(self.read()?.ledger.loan_status(id, now)?)
    }

    pub fn borrower_positions(
        &self,
        borrower: &AccountId,
    ) -> Result<Vec<BorrowerPosition>, ServiceError> {
        let now = self.clock.now();
        Ok(self.read()?.ledger.borrower_positions(borrower, now))
    }

    pub fn open_requests(&self) -> Result<Vec<LoanRequest>, ServiceError> {
        Ok(self.read()?.ledger.open_requests())
    }

    pub fn live_loans(&self) -> Result<Vec<ActiveLoan>, ServiceError> {
        let now = self.clock.now();
        Ok(self.read()?.ledger.live_loans(now))
    }

    pub fn balance(&self, account: &AccountId) -> Result<Amount, ServiceError> {
        Ok(self.read()?.bank.balance(account))
    }

    pub fn stats(&self) -> Result<LedgerStats, ServiceError> {
        let state = self.read()?;
        Ok(LedgerStats {
            total_requests: state.ledger.total_requests(),
            total_loans: state.ledger.total_loans(),
            custody_balance: state.ledger.custody_balance(),
        })
    }
}
