//! The loan ledger state machine.

use crate::error::LedgerError;
use crate::loan::ActiveLoan;
use crate::request::LoanRequest;
use crate::transfer::{Movement, ValueTransfer};
use peerlend_types::{AccountId, Amount, InterestRate, LoanId, RequestId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A borrower-relevant record: an open request or a live loan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BorrowerPosition {
    Open(LoanRequest),
    Funded(ActiveLoan),
}

impl BorrowerPosition {
    pub fn id(&self) -> u64 {
        match self {
            BorrowerPosition::Open(r) => r.id,
            BorrowerPosition::Funded(l) => l.id,
        }
    }
}

/// The lending ledger — owns every request and loan record plus the custody
/// total of all locked stakes.
///
/// Mutating operations take the authenticated caller, the deposit attached
/// to the call, and the value-transfer backend; all checks and fallible
/// arithmetic run before the transfer, and state is mutated only after the
/// transfer batch succeeds, so every operation is all-or-nothing.
///
/// The ledger itself is single-writer: callers serialize mutations through
/// one exclusive handle (the service layer wraps it in a write lock).
pub struct LoanLedger {
    requests: BTreeMap<RequestId, LoanRequest>,
    loans: BTreeMap<LoanId, ActiveLoan>,
    total_requests: u64,
    total_loans: u64,
    /// Aggregate of all stakes currently locked. Always equals the sum of
    /// `stake` over active requests plus unrepaid loans.
    custody: Amount,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            loans: BTreeMap::new(),
            total_requests: 0,
            total_loans: 0,
            custody: Amount::ZERO,
        }
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Create a loan request, locking the deposited stake in custody.
    ///
    /// The stake must be at least twice the requested principal.
    pub fn create_request(
        &mut self,
        borrower: AccountId,
        loan_amount: Amount,
        duration_days: u64,
        deposit: Amount,
        bank: &mut dyn ValueTransfer,
    ) -> Result<RequestId, LedgerError> {
        if loan_amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if duration_days == 0 {
            return Err(LedgerError::InvalidDuration);
        }
        let required = loan_amount.checked_double().ok_or(LedgerError::Overflow)?;
        if deposit < required {
            return Err(LedgerError::InsufficientCollateral {
                required,
                deposited: deposit,
            });
        }
        let custody = self
            .custody
            .checked_add(deposit)
            .ok_or(LedgerError::Overflow)?;

        bank.apply(&[Movement::debit(borrower.clone(), deposit)])?;

        let id = self.total_requests;
        self.requests.insert(
            id,
            LoanRequest {
                id,
                borrower,
                loan_amount,
                duration_days,
                stake: deposit,
                is_active: true,
            },
        );
        self.total_requests += 1;
        self.custody = custody;
        Ok(id)
    }

    /// Fund an active request at a chosen interest rate.
    ///
    /// The deposit must equal the requested principal exactly; it is
    /// disbursed to the borrower in the same step. The resulting loan keeps
    /// the request's id. Nothing stops a lender from funding their own
    /// request.
    pub fn fund_request(
        &mut self,
        lender: AccountId,
        request_id: RequestId,
        interest_rate: InterestRate,
        deposit: Amount,
        now: Timestamp,
        bank: &mut dyn ValueTransfer,
    ) -> Result<LoanId, LedgerError> {
        let request = self
            .requests
            .get(&request_id)
            .ok_or(LedgerError::RequestNotFound(request_id))?;
        if !request.is_active {
            return Err(LedgerError::RequestNotActive(request_id));
        }
        if deposit != request.loan_amount {
            return Err(LedgerError::AmountMismatch {
                required: request.loan_amount,
                deposited: deposit,
            });
        }
        let borrower = request.borrower.clone();
        let end_time = now.plus_days(request.duration_days);

        // Principal passes straight through to the borrower; custody holds
        // only the stake, which stays locked.
        bank.apply(&[
            Movement::debit(lender.clone(), deposit),
            Movement::credit(borrower.clone(), deposit),
        ])?;

        let request = self
            .requests
            .get_mut(&request_id)
            .ok_or(LedgerError::RequestNotFound(request_id))?;
        request.is_active = false;
        let loan = ActiveLoan {
            id: request_id,
            borrower,
            lender,
            loan_amount: request.loan_amount,
            stake: request.stake,
            interest_rate,
            end_time,
            is_repaid: false,
        };
        self.loans.insert(request_id, loan);
        self.total_loans += 1;
        Ok(request_id)
    }

    /// Repay a loan in full.
    ///
    /// Only the borrower may repay, the deposit must equal principal plus
    /// floored interest exactly, and repayment is accepted before or after
    /// the end time as long as the loan has not been liquidated. The
    /// repayment goes to the lender and the locked stake returns to the
    /// borrower.
    pub fn repay_loan(
        &mut self,
        caller: AccountId,
        loan_id: LoanId,
        deposit: Amount,
        bank: &mut dyn ValueTransfer,
    ) -> Result<(), LedgerError> {
        let loan = self
            .loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if caller != loan.borrower {
            return Err(LedgerError::NotBorrower(loan_id));
        }
        if loan.is_repaid {
            return Err(LedgerError::AlreadyRepaid(loan_id));
        }
        let required = loan.repayment_due().ok_or(LedgerError::Overflow)?;
        if deposit != required {
            return Err(LedgerError::InsufficientRepayment {
                required,
                deposited: deposit,
            });
        }
        let stake = loan.stake;
        let lender = loan.lender.clone();
        let custody = self
            .custody
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;

        bank.apply(&[
            Movement::debit(caller.clone(), deposit),
            Movement::credit(lender, deposit),
            Movement::credit(caller, stake),
        ])?;

        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        loan.is_repaid = true;
        self.custody = custody;
        Ok(())
    }

    /// Liquidate an expired, unrepaid loan — callable by anyone.
    ///
    /// The locked stake is forfeited to the lender; the defaulted principal
    /// is not transferred separately, since the stake covers at least twice
    /// the principal.
    pub fn liquidate_expired(
        &mut self,
        loan_id: LoanId,
        now: Timestamp,
        bank: &mut dyn ValueTransfer,
    ) -> Result<(), LedgerError> {
        let loan = self
            .loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        if !loan.is_expired(now) {
            return Err(LedgerError::NotExpired {
                loan_id,
                end_time: loan.end_time,
            });
        }
        if loan.is_repaid {
            return Err(LedgerError::AlreadyRepaid(loan_id));
        }
        let stake = loan.stake;
        let lender = loan.lender.clone();
        let custody = self
            .custody
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;

        bank.apply(&[Movement::credit(lender, stake)])?;

        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        loan.is_repaid = true;
        self.custody = custody;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Status of a loan at `now`. Repaid takes precedence over expiry.
    pub fn loan_status(
        &self,
        loan_id: LoanId,
        now: Timestamp,
    ) -> Result<peerlend_types::LoanStatus, LedgerError> {
        let loan = self
            .loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        Ok(if loan.is_repaid {
            peerlend_types::LoanStatus::Repaid
        } else if loan.is_expired(now) {
            peerlend_types::LoanStatus::Expired
        } else {
            peerlend_types::LoanStatus::Active
        })
    }

    /// All currently relevant records for one borrower, ascending by id:
    /// their open requests and their live (unrepaid, unexpired) loans.
    pub fn borrower_positions(
        &self,
        borrower: &AccountId,
        now: Timestamp,
    ) -> Vec<BorrowerPosition> {
        // A funded request is inactive, so each id contributes at most one
        // entry and request-id order covers both collections.
        self.requests
            .values()
            .filter(|r| r.borrower == *borrower)
            .filter_map(|r| {
                if r.is_active {
                    Some(BorrowerPosition::Open(r.clone()))
                } else {
                    self.loans
                        .get(&r.id)
                        .filter(|l| l.is_live(now))
                        .map(|l| BorrowerPosition::Funded(l.clone()))
                }
            })
            .collect()
    }

    /// All still-open requests, ascending by id.
    pub fn open_requests(&self) -> Vec<LoanRequest> {
        self.requests
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect()
    }

    /// All live loans (not repaid, not expired) at `now`, ascending by id.
    pub fn live_loans(&self, now: Timestamp) -> Vec<ActiveLoan> {
        self.loans
            .values()
            .filter(|l| l.is_live(now))
            .cloned()
            .collect()
    }

    /// Fetch a single request by id.
    pub fn request(&self, id: RequestId) -> Option<&LoanRequest> {
        self.requests.get(&id)
    }

    /// Fetch a single loan by id.
    pub fn loan(&self, id: LoanId) -> Option<&ActiveLoan> {
        self.loans.get(&id)
    }

    /// Cumulative number of requests ever created.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Cumulative number of loans ever funded.
    pub fn total_loans(&self) -> u64 {
        self.total_loans
    }

    /// Aggregate of all stakes currently locked.
    pub fn custody_balance(&self) -> Amount {
        self.custody
    }
}

impl Default for LoanLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::MemoryBank;
    use peerlend_types::LoanStatus;

    const ETH: u128 = 1_000_000_000_000_000_000;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn funded_bank() -> MemoryBank {
        let mut bank = MemoryBank::new();
        bank.deposit(acct("borrower"), Amount::new(10 * ETH));
        bank.deposit(acct("lender"), Amount::new(10 * ETH));
        bank
    }

    /// Recompute what custody should be from the records themselves.
    fn expected_custody(ledger: &LoanLedger) -> Amount {
        let mut sum = Amount::ZERO;
        for id in 0..ledger.total_requests() {
            if let Some(r) = ledger.request(id) {
                if r.is_active {
                    sum = sum.checked_add(r.stake).unwrap();
                }
            }
            if let Some(l) = ledger.loan(id) {
                if !l.is_repaid {
                    sum = sum.checked_add(l.stake).unwrap();
                }
            }
        }
        sum
    }

    fn assert_custody_invariant(ledger: &LoanLedger) {
        assert_eq!(ledger.custody_balance(), expected_custody(ledger));
    }

    /// Create a 1 ETH / 30 day request with a 2 ETH stake.
    fn create_standard_request(ledger: &mut LoanLedger, bank: &mut MemoryBank) -> RequestId {
        ledger
            .create_request(
                acct("borrower"),
                Amount::new(ETH),
                30,
                Amount::new(2 * ETH),
                bank,
            )
            .unwrap()
    }

    // ── create_request ────────────────────────────────────────────────

    #[test]
    fn create_request_locks_stake_and_records_fields() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        let id = create_standard_request(&mut ledger, &mut bank);
        assert_eq!(id, 0);

        let request = ledger.request(0).unwrap();
        assert_eq!(request.borrower, acct("borrower"));
        assert_eq!(request.loan_amount, Amount::new(ETH));
        assert_eq!(request.duration_days, 30);
        assert_eq!(request.stake, Amount::new(2 * ETH));
        assert!(request.is_active);

        assert_eq!(ledger.total_requests(), 1);
        assert_eq!(ledger.custody_balance(), Amount::new(2 * ETH));
        assert_eq!(bank.balance(&acct("borrower")), Amount::new(8 * ETH));
        assert_custody_invariant(&ledger);
    }

    #[test]
    fn create_request_assigns_dense_ids() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        assert_eq!(create_standard_request(&mut ledger, &mut bank), 0);
        assert_eq!(create_standard_request(&mut ledger, &mut bank), 1);
        assert_eq!(create_standard_request(&mut ledger, &mut bank), 2);
        assert_eq!(ledger.total_requests(), 3);
    }

    #[test]
    fn create_request_rejects_low_collateral() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        let err = ledger
            .create_request(
                acct("borrower"),
                Amount::new(ETH),
                30,
                Amount::new(ETH / 2),
                &mut bank,
            )
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientCollateral {
                required: Amount::new(2 * ETH),
                deposited: Amount::new(ETH / 2),
            }
        );
        // No partial state change.
        assert_eq!(ledger.total_requests(), 0);
        assert_eq!(ledger.custody_balance(), Amount::ZERO);
        assert_eq!(bank.balance(&acct("borrower")), Amount::new(10 * ETH));
    }

    #[test]
    fn create_request_rejects_zero_amount() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        let err = ledger
            .create_request(acct("borrower"), Amount::ZERO, 30, Amount::new(2 * ETH), &mut bank)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount);
        assert_eq!(ledger.total_requests(), 0);
    }

    #[test]
    fn create_request_rejects_zero_duration() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        let err = ledger
            .create_request(
                acct("borrower"),
                Amount::new(ETH),
                0,
                Amount::new(2 * ETH),
                &mut bank,
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidDuration);
        assert_eq!(ledger.total_requests(), 0);
    }

    #[test]
    fn create_request_fails_when_borrower_cannot_cover_stake() {
        let mut ledger = LoanLedger::new();
        let mut bank = MemoryBank::new();
        bank.deposit(acct("borrower"), Amount::new(ETH));

        let err = ledger
            .create_request(
                acct("borrower"),
                Amount::new(ETH),
                30,
                Amount::new(2 * ETH),
                &mut bank,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Transfer(_)));
        // Transfer failure rolls the whole operation back.
        assert_eq!(ledger.total_requests(), 0);
        assert_eq!(ledger.custody_balance(), Amount::ZERO);
        assert_eq!(bank.balance(&acct("borrower")), Amount::new(ETH));
    }

    // ── fund_request ──────────────────────────────────────────────────

    #[test]
    fn fund_request_creates_loan_and_pays_borrower() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        let loan_id = ledger
            .fund_request(
                acct("lender"),
                0,
                InterestRate::new(5),
                Amount::new(ETH),
                now,
                &mut bank,
            )
            .unwrap();
        assert_eq!(loan_id, 0);

        let loan = ledger.loan(0).unwrap();
        assert_eq!(loan.lender, acct("lender"));
        assert_eq!(loan.borrower, acct("borrower"));
        assert_eq!(loan.loan_amount, Amount::new(ETH));
        assert_eq!(loan.stake, Amount::new(2 * ETH));
        assert_eq!(loan.interest_rate, InterestRate::new(5));
        assert_eq!(loan.end_time, now.plus_days(30));
        assert!(!loan.is_repaid);

        assert!(!ledger.request(0).unwrap().is_active);
        assert_eq!(ledger.total_loans(), 1);

        // Principal moved lender → borrower; stake still in custody.
        assert_eq!(bank.balance(&acct("lender")), Amount::new(9 * ETH));
        assert_eq!(bank.balance(&acct("borrower")), Amount::new(9 * ETH));
        assert_eq!(ledger.custody_balance(), Amount::new(2 * ETH));
        assert_custody_invariant(&ledger);
    }

    #[test]
    fn fund_request_rejects_wrong_principal() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        for wrong in [Amount::new(ETH / 2), Amount::new(2 * ETH), Amount::ZERO] {
            let err = ledger
                .fund_request(acct("lender"), 0, InterestRate::new(5), wrong, now, &mut bank)
                .unwrap_err();
            assert_eq!(
                err,
                LedgerError::AmountMismatch {
                    required: Amount::new(ETH),
                    deposited: wrong,
                }
            );
        }
        // Request stays open.
        assert!(ledger.request(0).unwrap().is_active);
        assert_eq!(ledger.total_loans(), 0);
    }

    #[test]
    fn fund_request_rejects_already_funded() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let err = ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap_err();
        assert_eq!(err, LedgerError::RequestNotActive(0));
        assert_eq!(ledger.total_loans(), 1);
    }

    #[test]
    fn fund_request_rejects_unknown_id() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        let err = ledger
            .fund_request(
                acct("lender"),
                42,
                InterestRate::new(5),
                Amount::new(ETH),
                Timestamp::EPOCH,
                &mut bank,
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::RequestNotFound(42));
    }

    #[test]
    fn borrower_may_fund_their_own_request() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();

        create_standard_request(&mut ledger, &mut bank);
        let loan_id = ledger
            .fund_request(
                acct("borrower"),
                0,
                InterestRate::new(5),
                Amount::new(ETH),
                Timestamp::new(1_000_000),
                &mut bank,
            )
            .unwrap();
        let loan = ledger.loan(loan_id).unwrap();
        assert_eq!(loan.lender, loan.borrower);
    }

    // ── repay_loan ────────────────────────────────────────────────────

    #[test]
    fn repay_settles_loan_and_returns_stake() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let due = Amount::new(ETH + ETH * 5 / 100); // 1.05 ETH
        ledger
            .repay_loan(acct("borrower"), 0, due, &mut bank)
            .unwrap();

        assert!(ledger.loan(0).unwrap().is_repaid);
        assert_eq!(ledger.custody_balance(), Amount::ZERO);
        // Lender: 10 − 1 + 1.05; borrower: 10 − 2 + 1 + 2 − 1.05.
        assert_eq!(bank.balance(&acct("lender")), Amount::new(10 * ETH + ETH * 5 / 100));
        assert_eq!(
            bank.balance(&acct("borrower")),
            Amount::new(10 * ETH - ETH * 5 / 100)
        );
        assert_custody_invariant(&ledger);
    }

    #[test]
    fn repay_rejects_non_borrower() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let due = Amount::new(ETH + ETH * 5 / 100);
        let err = ledger
            .repay_loan(acct("lender"), 0, due, &mut bank)
            .unwrap_err();
        assert_eq!(err, LedgerError::NotBorrower(0));
        assert!(!ledger.loan(0).unwrap().is_repaid);
    }

    #[test]
    fn repay_rejects_inexact_amount() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let due = Amount::new(ETH + ETH * 5 / 100);
        // Principal alone is not enough, and overpayment is rejected too —
        // the exact amount is required.
        for wrong in [Amount::new(ETH), Amount::new(2 * ETH)] {
            let err = ledger
                .repay_loan(acct("borrower"), 0, wrong, &mut bank)
                .unwrap_err();
            assert_eq!(
                err,
                LedgerError::InsufficientRepayment {
                    required: due,
                    deposited: wrong,
                }
            );
        }
        assert!(!ledger.loan(0).unwrap().is_repaid);
        assert_custody_invariant(&ledger);
    }

    #[test]
    fn repay_rejects_second_attempt() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let due = Amount::new(ETH + ETH * 5 / 100);
        ledger
            .repay_loan(acct("borrower"), 0, due, &mut bank)
            .unwrap();
        let err = ledger
            .repay_loan(acct("borrower"), 0, due, &mut bank)
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRepaid(0));
    }

    #[test]
    fn repay_is_accepted_after_expiry_until_liquidated() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let due = Amount::new(ETH + ETH * 5 / 100);
        // Well past the 30-day term; repayment still settles the loan.
        ledger
            .repay_loan(acct("borrower"), 0, due, &mut bank)
            .unwrap();
        let after = now.plus_days(31);
        assert_eq!(ledger.loan_status(0, after).unwrap(), LoanStatus::Repaid);
    }

    // ── liquidate_expired ─────────────────────────────────────────────

    #[test]
    fn liquidate_forfeits_stake_to_lender() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let after = Timestamp::new(now.plus_days(30).as_secs() + 1);
        ledger.liquidate_expired(0, after, &mut bank).unwrap();

        assert!(ledger.loan(0).unwrap().is_repaid);
        assert_eq!(ledger.custody_balance(), Amount::ZERO);
        // Lender lent 1 and received the 2 ETH stake.
        assert_eq!(bank.balance(&acct("lender")), Amount::new(11 * ETH));
        // Borrower keeps the principal and forfeits the stake.
        assert_eq!(bank.balance(&acct("borrower")), Amount::new(9 * ETH));
        assert_custody_invariant(&ledger);
    }

    #[test]
    fn liquidate_rejects_before_expiry() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let end_time = now.plus_days(30);
        // At exactly the end time the loan is not yet expired.
        for at in [now, end_time] {
            let err = ledger.liquidate_expired(0, at, &mut bank).unwrap_err();
            assert_eq!(err, LedgerError::NotExpired { loan_id: 0, end_time });
        }
        assert!(!ledger.loan(0).unwrap().is_repaid);
    }

    #[test]
    fn liquidate_rejects_second_attempt() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let after = Timestamp::new(now.plus_days(30).as_secs() + 1);
        ledger.liquidate_expired(0, after, &mut bank).unwrap();
        let err = ledger.liquidate_expired(0, after, &mut bank).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRepaid(0));
    }

    #[test]
    fn liquidate_rejects_repaid_loan() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();
        ledger
            .repay_loan(acct("borrower"), 0, Amount::new(ETH + ETH * 5 / 100), &mut bank)
            .unwrap();

        let after = Timestamp::new(now.plus_days(30).as_secs() + 1);
        let err = ledger.liquidate_expired(0, after, &mut bank).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRepaid(0));
    }

    // ── loan_status ───────────────────────────────────────────────────

    #[test]
    fn status_tracks_lifecycle() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let end_time = now.plus_days(30);
        assert_eq!(ledger.loan_status(0, now).unwrap(), LoanStatus::Active);
        // Still active at exactly the end time.
        assert_eq!(ledger.loan_status(0, end_time).unwrap(), LoanStatus::Active);
        let after = Timestamp::new(end_time.as_secs() + 1);
        assert_eq!(ledger.loan_status(0, after).unwrap(), LoanStatus::Expired);

        ledger
            .repay_loan(acct("borrower"), 0, Amount::new(ETH + ETH * 5 / 100), &mut bank)
            .unwrap();
        // Repaid wins over expiry.
        assert_eq!(ledger.loan_status(0, after).unwrap(), LoanStatus::Repaid);
    }

    #[test]
    fn status_of_unknown_loan_is_not_found() {
        let ledger = LoanLedger::new();
        let err = ledger.loan_status(9, Timestamp::EPOCH).unwrap_err();
        assert_eq!(err, LedgerError::LoanNotFound(9));
    }

    // ── listings ──────────────────────────────────────────────────────

    #[test]
    fn borrower_positions_mixes_requests_and_loans_in_id_order() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        bank.deposit(acct("other"), Amount::new(10 * ETH));
        let now = Timestamp::new(1_000_000);

        // id 0: borrower, funded; id 1: other borrower; id 2: borrower, open.
        create_standard_request(&mut ledger, &mut bank);
        ledger
            .create_request(acct("other"), Amount::new(ETH), 10, Amount::new(2 * ETH), &mut bank)
            .unwrap();
        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let positions = ledger.borrower_positions(&acct("borrower"), now);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].id(), 0);
        assert!(matches!(positions[0], BorrowerPosition::Funded(_)));
        assert_eq!(positions[1].id(), 2);
        assert!(matches!(positions[1], BorrowerPosition::Open(_)));
    }

    #[test]
    fn borrower_positions_drops_repaid_and_expired_loans() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        // Two funded loans: one repaid, one that will expire.
        create_standard_request(&mut ledger, &mut bank);
        create_standard_request(&mut ledger, &mut bank);
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();
        ledger
            .fund_request(acct("lender"), 1, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();
        ledger
            .repay_loan(acct("borrower"), 0, Amount::new(ETH + ETH * 5 / 100), &mut bank)
            .unwrap();

        let after = Timestamp::new(now.plus_days(30).as_secs() + 1);
        assert!(ledger.borrower_positions(&acct("borrower"), after).is_empty());
        // Before expiry, only the unrepaid loan shows.
        let before = ledger.borrower_positions(&acct("borrower"), now);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id(), 1);
    }

    #[test]
    fn live_loans_and_open_requests_filter_and_order() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        let now = Timestamp::new(1_000_000);

        for _ in 0..3 {
            create_standard_request(&mut ledger, &mut bank);
        }
        // Fund 2 then 0, leaving 1 open; loan ids follow request ids.
        ledger
            .fund_request(acct("lender"), 2, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();
        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(7), Amount::new(ETH), now, &mut bank)
            .unwrap();

        let open = ledger.open_requests();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, 1);

        let live = ledger.live_loans(now);
        assert_eq!(live.iter().map(|l| l.id).collect::<Vec<_>>(), vec![0, 2]);

        ledger
            .repay_loan(acct("borrower"), 2, Amount::new(ETH + ETH * 5 / 100), &mut bank)
            .unwrap();
        let live = ledger.live_loans(now);
        assert_eq!(live.iter().map(|l| l.id).collect::<Vec<_>>(), vec![0]);
        assert_custody_invariant(&ledger);
    }

    // ── custody invariant across a mixed history ──────────────────────

    #[test]
    fn custody_equals_sum_of_locked_stakes_throughout() {
        let mut ledger = LoanLedger::new();
        let mut bank = funded_bank();
        bank.deposit(acct("other"), Amount::new(20 * ETH));
        let now = Timestamp::new(1_000_000);

        create_standard_request(&mut ledger, &mut bank);
        assert_custody_invariant(&ledger);
        ledger
            .create_request(acct("other"), Amount::new(2 * ETH), 5, Amount::new(5 * ETH), &mut bank)
            .unwrap();
        assert_custody_invariant(&ledger);

        ledger
            .fund_request(acct("lender"), 0, InterestRate::new(5), Amount::new(ETH), now, &mut bank)
            .unwrap();
        assert_custody_invariant(&ledger);
        ledger
            .fund_request(acct("lender"), 1, InterestRate::new(3), Amount::new(2 * ETH), now, &mut bank)
            .unwrap();
        assert_custody_invariant(&ledger);

        ledger
            .repay_loan(acct("borrower"), 0, Amount::new(ETH + ETH * 5 / 100), &mut bank)
            .unwrap();
        assert_custody_invariant(&ledger);

        let after = Timestamp::new(now.plus_days(5).as_secs() + 1);
        ledger.liquidate_expired(1, after, &mut bank).unwrap();
        assert_custody_invariant(&ledger);
        assert_eq!(ledger.custody_balance(), Amount::ZERO);
    }
}
