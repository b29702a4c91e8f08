//! # Core Entities
//!
//! Identifiers and value types shared across the client domains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A client state domain. Each one owns exactly one mutable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    /// Soft/hard currency balances.
    Currency,
    /// Owned and equipped items.
    Inventory,
    /// Achievement progress and claims.
    Achievements,
    /// Task progress and claims.
    Tasks,
    /// Energy counters and regeneration.
    Energy,
    /// Referral codes and referral rewards.
    Referrals,
    /// Run-session lifecycle (pessimistic).
    Session,
}

impl Domain {
    /// All domains, in initialisation order.
    pub const ALL: [Domain; 7] = [
        Domain::Currency,
        Domain::Inventory,
        Domain::Achievements,
        Domain::Tasks,
        Domain::Energy,
        Domain::Referrals,
        Domain::Session,
    ];

    /// Stable lowercase label used for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Domain::Currency => "currency",
            Domain::Inventory => "inventory",
            Domain::Achievements => "achievements",
            Domain::Tasks => "tasks",
            Domain::Energy => "energy",
            Domain::Referrals => "referrals",
            Domain::Session => "session",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-game currency kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurrencyType {
    /// Coins earned during runs.
    SoftCurrency,
    /// Premium gems, usually purchased.
    HardCurrency,
}

impl CurrencyType {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CurrencyType::SoftCurrency => "soft",
            CurrencyType::HardCurrency => "hard",
        }
    }
}

impl fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount of one currency, used for rewards and prices alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyAmount {
    /// Which currency.
    pub currency: CurrencyType,
    /// How much of it.
    pub amount: u64,
}

impl CurrencyAmount {
    /// Create a new amount.
    #[must_use]
    pub const fn new(currency: CurrencyType, amount: u64) -> Self {
        Self { currency, amount }
    }

    /// Soft-currency shorthand.
    #[must_use]
    pub const fn soft(amount: u64) -> Self {
        Self::new(CurrencyType::SoftCurrency, amount)
    }

    /// Hard-currency shorthand.
    #[must_use]
    pub const fn hard(amount: u64) -> Self {
        Self::new(CurrencyType::HardCurrency, amount)
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// A currency effect attached to a dual-resource operation.
///
/// Reward claims credit the ledger; purchases debit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntry {
    /// Add the amount to the balance.
    Credit(CurrencyAmount),
    /// Remove the amount from the balance.
    Debit(CurrencyAmount),
}

impl LedgerEntry {
    /// The amount carried by this entry.
    #[must_use]
    pub const fn amount(&self) -> CurrencyAmount {
        match self {
            LedgerEntry::Credit(a) | LedgerEntry::Debit(a) => *a,
        }
    }

    /// The entry that undoes this one.
    #[must_use]
    pub const fn inverse(&self) -> Self {
        match self {
            LedgerEntry::Credit(a) => LedgerEntry::Debit(*a),
            LedgerEntry::Debit(a) => LedgerEntry::Credit(*a),
        }
    }
}

/// Run-session lifecycle state.
///
/// ```text
/// [None] ──start──→ [Requesting] ──accepted──→ [Active] ──submit──→ [Submitting]
///                        │                        │                     │
///                        └──rejected/error──→ [Failed] ←──rejected/error┘
///                                                 │                     │
///                          [Cancelled] ←──cancel──┘          accepted──→ [Completed]
/// ```
///
/// Terminal states (`Completed`, `Failed`, `Cancelled`) accept a new start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No session attempted yet.
    #[default]
    None,
    /// Start request is in flight.
    Requesting,
    /// Server granted the session.
    Active,
    /// Result submission is in flight.
    Submitting,
    /// Server accepted the result.
    Completed,
    /// Start or submission failed.
    Failed,
    /// Client abandoned the active session.
    Cancelled,
}

impl SessionState {
    /// Whether a session attempt is outstanding.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(
            self,
            SessionState::Requesting | SessionState::Active | SessionState::Submitting
        )
    }

    /// Whether this state ends an attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Cancelled
        )
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::None => "none",
            SessionState::Requesting => "requesting",
            SessionState::Active => "active",
            SessionState::Submitting => "submitting",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
