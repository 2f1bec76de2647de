//! Account balances and the ledger boundary.
//!
//! The matching engine never touches balances directly. It reports each
//! execution through [`Ledger::apply_fill`] before finalizing the level or
//! order mutation that produced it; [`Account`] is the ledger used by the venue.

use crate::types::{Fill, Side};

/// Receiver of fill notifications from the matching engine.
pub trait Ledger {
    /// Apply the balance effect of one fill
    fn apply_fill(&mut self, fill: &Fill);
}

/// Records fills without touching any balance. Handy for replaying a pass.
impl Ledger for Vec<Fill> {
    fn apply_fill(&mut self, fill: &Fill) {
        self.push(*fill);
    }
}

/// Two-currency account for the simulated trader.
///
/// ## Example
///
/// ```
/// use tickbook::types::{Account, Fill, Ledger, Side};
///
/// let mut account = Account::new(0.0, 10.0);
/// account.apply_fill(&Fill::new(1, Side::Bid, 1.25, 4.0));
///
/// assert_eq!(account.base_balance, 4.0);
/// assert_eq!(account.quote_balance, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Account {
    /// Balance of the traded currency (e.g. GBP)
    pub base_balance: f64,

    /// Balance of the pricing currency (e.g. USD)
    pub quote_balance: f64,
}

impl Account {
    /// Create an account with starting balances
    pub fn new(base_balance: f64, quote_balance: f64) -> Self {
        Self {
            base_balance,
            quote_balance,
        }
    }

    /// Balance required for an order on `side`, and the balance available for it.
    ///
    /// The check is point-in-time; resting orders do not reserve funds.
    /// A Bid needs `price * volume` of quote currency, an Ask needs `volume`
    /// of base currency.
    pub fn requirement(&self, side: Side, price: f64, volume: f64) -> (f64, f64) {
        match side {
            Side::Bid => (price * volume, self.quote_balance),
            Side::Ask => (volume, self.base_balance),
        }
    }

    /// Mark-to-market value in quote currency
    #[inline]
    pub fn portfolio_value(&self, mark_price: f64) -> f64 {
        self.base_balance * mark_price + self.quote_balance
    }
}

impl Ledger for Account {
    fn apply_fill(&mut self, fill: &Fill) {
        match fill.side {
            Side::Bid => {
                self.base_balance += fill.volume;
                self.quote_balance -= fill.notional();
            }
            Side::Ask => {
                self.quote_balance += fill.notional();
                self.base_balance -= fill.volume;
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
