//! Interest rate type and interest computation.

use crate::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lender-chosen interest rate as a whole percentage of the principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestRate(u16);

impl InterestRate {
    pub const ZERO: Self = Self(0);

    pub fn new(percent: u16) -> Self {
        Self(percent)
    }

    pub fn percent(&self) -> u16 {
        self.0
    }

    /// Interest owed on `principal` at this rate:
    /// `floor(principal × rate / 100)`.
    ///
    /// Returns `None` if the intermediate product overflows u128.
    pub fn interest_on(&self, principal: Amount) -> Option<Amount> {
        principal
            .raw()
            .checked_mul(u128::from(self.0))
            .map(|p| Amount::new(p / 100))
    }

    /// Total repayment owed on `principal`: principal plus interest.
    pub fn repayment_due(&self, principal: Amount) -> Option<Amount> {
        self.interest_on(principal)
            .and_then(|i| principal.checked_add(i))
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
