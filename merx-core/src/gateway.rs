use crate::payment::PaymentError;
use crate::pii::Masked;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A charge creation request, one per settlement.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    /// Amount in minor currency units (cents).
    pub amount: i64,
    pub currency: String,
    /// Token or source reference the charge is executed against.
    pub card: String,
    pub description: String,
    pub api_key: Masked<String>,
}

/// A settled charge as reported by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// External payment processor boundary.
///
/// One call per settlement. Retries, timeouts and cancellation are the
/// caller's concern, not this trait's; once a request is sent it cannot be
/// aborted from here.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError>;
}
