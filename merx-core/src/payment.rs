use crate::money::Money;
use crate::order::LineQuantity;
use crate::reference::{PaymentEventKind, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors raised while taking or recording payments.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// No payment token was supplied with the order submission.
    #[error("No token found.")]
    MissingToken,

    /// The processor refused the card.
    #[error("card declined: {0}")]
    Declined(String),

    /// Any other processor-side failure.
    #[error("payment failed: {0}")]
    Failed(String),
}

/// An authorization hold against an external payment method, together with
/// the cumulative amount settled against it.
///
/// Created once at checkout, debited on each settlement, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: Uuid,
    pub kind: SourceKind,
    pub currency: String,
    pub amount_allocated: Money,
    pub amount_debited: Money,
    /// Processor-side reference the hold was created under; settlements
    /// charge against it.
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentSource {
    /// Record a pre-auth hold: the full amount is allocated, nothing is
    /// debited until settlement.
    pub fn pre_auth(
        kind: SourceKind,
        currency: impl Into<String>,
        amount_allocated: Money,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            currency: currency.into(),
            amount_allocated,
            amount_debited: Money::ZERO,
            reference: reference.into(),
            created_at: Utc::now(),
        }
    }

    /// Allocation not yet captured.
    pub fn remaining(&self) -> Money {
        self.amount_allocated - self.amount_debited
    }

    /// Capture part of the allocation.
    pub fn debit(&mut self, amount: Money) {
        self.amount_debited += amount;
        tracing::debug!(source = %self.id, %amount, remaining = %self.remaining(), "payment source debited");
    }
}

/// Immutable audit record of a payment action. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: Uuid,
    pub kind: PaymentEventKind,
    pub amount: Money,
    /// Lines and quantities the event covers; empty for whole-order events.
    pub lines: Vec<LineQuantity>,
    /// Processor reference: the token for a pre-auth, the charge id for a
    /// settlement.
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentEvent {
    pub fn new(
        kind: PaymentEventKind,
        amount: Money,
        lines: Vec<LineQuantity>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            lines,
            reference: reference.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_auth_allocates_without_debiting() {
        let source = PaymentSource::pre_auth(SourceKind::Stripe, "eur", Money::new(100, 0), "tok_visa");

        assert_eq!(source.amount_allocated, Money::new(100, 0));
        assert_eq!(source.amount_debited, Money::ZERO);
        assert_eq!(source.remaining(), Money::new(100, 0));
        assert_eq!(source.reference, "tok_visa");
    }

    #[test]
    fn test_debit_decrements_remaining() {
        let mut source = PaymentSource::pre_auth(SourceKind::Stripe, "eur", Money::new(100, 0), "tok_visa");

        source.debit(Money::new(55, 0));
        assert_eq!(source.amount_debited, Money::new(55, 0));
        assert_eq!(source.remaining(), Money::new(45, 0));

        source.debit(Money::new(45, 0));
        assert_eq!(source.amount_debited, Money::new(100, 0));
        assert_eq!(source.remaining(), Money::ZERO);
    }
}
