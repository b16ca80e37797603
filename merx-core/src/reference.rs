use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment source types the shop accepts.
///
/// The set is closed: reference records are enumerated here rather than
/// created on demand from whatever name arrives at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Stripe,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Stripe => "Stripe",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payment event types recorded against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentEventKind {
    PreAuth,
    Settle,
}

impl PaymentEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentEventKind::PreAuth => "pre-auth",
            PaymentEventKind::Settle => "Settle",
        }
    }
}

impl fmt::Display for PaymentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shipping event types recognised by fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingEventKind {
    Shipped,
    Returned,
}

impl ShippingEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShippingEventKind::Shipped => "Shipped",
            ShippingEventKind::Returned => "Returned",
        }
    }
}

impl fmt::Display for ShippingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("unknown source type: {0}")]
    UnknownSourceType(String),

    #[error("unknown payment event type: {0}")]
    UnknownPaymentEventType(String),

    #[error("unknown shipping event type: {0}")]
    UnknownShippingEventType(String),
}

/// Resolves reference-record names arriving at the system boundary to the
/// enumerated kinds above. Unknown names are rejected instead of being
/// created on the fly.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn source_kind(&self, name: &str) -> Result<SourceKind, ReferenceError>;

    async fn payment_event_kind(&self, name: &str) -> Result<PaymentEventKind, ReferenceError>;

    async fn shipping_event_kind(&self, name: &str) -> Result<ShippingEventKind, ReferenceError>;
}

/// Repository backed by the enumerated set itself. Suits deployments where
/// reference data is fixed; a store-backed implementation can resolve
/// against persisted rows instead.
pub struct StaticReferenceRepository;

#[async_trait]
impl ReferenceRepository for StaticReferenceRepository {
    async fn source_kind(&self, name: &str) -> Result<SourceKind, ReferenceError> {
        match name {
            "Stripe" => Ok(SourceKind::Stripe),
            other => Err(ReferenceError::UnknownSourceType(other.to_string())),
        }
    }

    async fn payment_event_kind(&self, name: &str) -> Result<PaymentEventKind, ReferenceError> {
        match name {
            "pre-auth" => Ok(PaymentEventKind::PreAuth),
            "Settle" => Ok(PaymentEventKind::Settle),
            other => Err(ReferenceError::UnknownPaymentEventType(other.to_string())),
        }
    }

    async fn shipping_event_kind(&self, name: &str) -> Result<ShippingEventKind, ReferenceError> {
        match name {
            "Shipped" => Ok(ShippingEventKind::Shipped),
            "Returned" => Ok(ShippingEventKind::Returned),
            other => Err(ReferenceError::UnknownShippingEventType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_names_resolve() {
        let repo = StaticReferenceRepository;

        assert_eq!(repo.source_kind("Stripe").await.unwrap(), SourceKind::Stripe);
        assert_eq!(repo.payment_event_kind("Settle").await.unwrap(), PaymentEventKind::Settle);
        assert_eq!(repo.payment_event_kind("pre-auth").await.unwrap(), PaymentEventKind::PreAuth);
        assert_eq!(repo.shipping_event_kind("Shipped").await.unwrap(), ShippingEventKind::Shipped);
    }

    #[tokio::test]
    async fn test_unknown_names_are_rejected() {
        let repo = StaticReferenceRepository;

        assert!(matches!(
            repo.source_kind("PayPal").await,
            Err(ReferenceError::UnknownSourceType(_))
        ));
        assert!(matches!(
            repo.shipping_event_kind("Lost").await,
            Err(ReferenceError::UnknownShippingEventType(_))
        ));
    }

    #[test]
    fn test_record_names() {
        assert_eq!(SourceKind::Stripe.name(), "Stripe");
        assert_eq!(PaymentEventKind::PreAuth.name(), "pre-auth");
        assert_eq!(PaymentEventKind::Settle.name(), "Settle");
        assert_eq!(ShippingEventKind::Shipped.name(), "Shipped");
    }
}
