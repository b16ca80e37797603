use async_trait::async_trait;
use merx_core::pii::Masked;
use merx_core::{Money, Order, PaymentError, PaymentEvent, PaymentSource};
use std::collections::HashMap;

/// Key under which the Stripe token travels in the submission's payment
/// arguments.
pub const STRIPE_PAYMENT_ARG: &str = "stripe";

/// Tax-inclusive order total as carried through checkout.
#[derive(Debug, Clone)]
pub struct OrderTotal {
    pub currency: String,
    pub incl_tax: Money,
}

/// Payload handed to the generic order-submission process.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub order_number: String,
    pub total: OrderTotal,
    /// Extra arguments made available to the payment handler at the
    /// payment step of submission.
    pub payment_args: HashMap<String, Masked<String>>,
}

/// Sources and events recorded by a payment handler, registered against
/// the order once the framework has created it.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub sources: Vec<PaymentSource>,
    pub events: Vec<PaymentEvent>,
}

impl PaymentUpdate {
    pub fn apply(self, order: &mut Order) {
        for source in self.sources {
            order.add_payment_source(source);
        }
        for event in self.events {
            order.add_payment_event(event);
        }
    }
}

/// Checkout-time payment hook invoked by the submission pipeline.
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    async fn handle_payment(
        &self,
        order_number: &str,
        total: &OrderTotal,
        payment_args: &HashMap<String, Masked<String>>,
    ) -> Result<PaymentUpdate, PaymentError>;
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Payment could not be taken; surfaced to the shopper as a checkout
    /// failure with an invitation to retry.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("order submission failed: {0}")]
    Pipeline(String),
}

/// The framework's generic order-submission process. Checkout composes
/// with it explicitly instead of overriding its internals.
#[async_trait]
pub trait OrderPipeline: Send + Sync {
    /// Base submission payload for the current basket.
    fn build_submission(&self) -> OrderSubmission;

    /// Run the submission, invoking the payment handler at the payment
    /// step.
    async fn submit(
        &self,
        submission: OrderSubmission,
        payments: &dyn PaymentHandler,
    ) -> Result<PlacedOrder, SubmissionError>;
}
