use crate::app_config::{SettlementConfig, SETTLEMENT_CURRENCY};
use async_trait::async_trait;
use merx_core::gateway::{Charge, ChargeRequest, PaymentGateway};
use merx_core::reference::{ReferenceError, ReferenceRepository};
use merx_core::{
    LineQuantity, Money, Order, PaymentError, PaymentEvent, PaymentEventKind, ShippingEvent,
    ShippingEventKind, SourceKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Errors raised while processing a shipping event.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// Preconditions for the shipping event did not hold.
    #[error("shipping event validation failed: {0}")]
    Validation(String),

    /// A shipped line id does not belong to the order.
    #[error("line {0} does not belong to order {1}")]
    UnknownLine(Uuid, String),

    /// The order was placed without the payment source settlement needs.
    #[error("order {0} has no {1} payment source")]
    MissingSource(String, SourceKind),

    /// Settling this amount would capture more than was authorized.
    #[error("settling {requested} would exceed the remaining allocation {remaining}")]
    ExceedsAllocation { requested: Money, remaining: Money },

    /// The processor refused or failed the charge.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Reserved stock could not be consumed.
    #[error("stock allocation update failed: {0}")]
    Stock(String),

    /// The inbound event type name is not one of the known kinds.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Framework hooks the settlement handler composes with. Precondition
/// validation and stock bookkeeping stay with the order pipeline.
#[async_trait]
pub trait FulfillmentPipeline: Send + Sync {
    async fn validate_shipping_event(
        &self,
        order: &Order,
        kind: ShippingEventKind,
        lines: &[LineQuantity],
    ) -> Result<(), SettlementError>;

    async fn consume_stock_allocations(
        &self,
        order: &Order,
        lines: &[LineQuantity],
    ) -> Result<(), SettlementError>;
}

/// Handles shipping events for orders paid through Stripe, settling the
/// shipped portion of the original pre-auth as goods leave the warehouse.
pub struct ShippingEventHandler {
    pipeline: Arc<dyn FulfillmentPipeline>,
    gateway: Arc<dyn PaymentGateway>,
    reference: Arc<dyn ReferenceRepository>,
    config: SettlementConfig,
}

impl ShippingEventHandler {
    pub fn new(
        pipeline: Arc<dyn FulfillmentPipeline>,
        gateway: Arc<dyn PaymentGateway>,
        reference: Arc<dyn ReferenceRepository>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            pipeline,
            gateway,
            reference,
            config,
        }
    }

    /// Resolve an inbound event-type name, then process the event.
    pub async fn handle_named_event(
        &self,
        order: &mut Order,
        event_name: &str,
        lines: &[LineQuantity],
        reference: Option<String>,
    ) -> Result<ShippingEvent, SettlementError> {
        let kind = self.reference.shipping_event_kind(event_name).await?;
        self.handle_shipping_event(order, kind, lines, reference).await
    }

    /// Process one shipping event: validate, settle payment for "Shipped"
    /// events, consume reserved stock, then record the event.
    pub async fn handle_shipping_event(
        &self,
        order: &mut Order,
        kind: ShippingEventKind,
        lines: &[LineQuantity],
        reference: Option<String>,
    ) -> Result<ShippingEvent, SettlementError> {
        self.pipeline.validate_shipping_event(order, kind, lines).await?;

        let mut payment_event_id = None;
        if kind == ShippingEventKind::Shipped {
            let payment_event = self.take_payment_for_lines(order, lines).await?;
            payment_event_id = Some(payment_event.id);
            self.pipeline.consume_stock_allocations(order, lines).await?;
        }

        let event = ShippingEvent::new(kind, lines.to_vec(), reference, payment_event_id);
        order.add_shipping_event(event.clone());
        Ok(event)
    }

    /// Settle the shipped portion against the order's Stripe pre-auth.
    ///
    /// Charge failures are noted on the order and re-raised; retrying is
    /// the caller's responsibility.
    pub async fn take_payment_for_lines(
        &self,
        order: &mut Order,
        lines: &[LineQuantity],
    ) -> Result<PaymentEvent, SettlementError> {
        let amount = self.amount_to_settle(order, lines)?;
        let number = order.number.clone();

        let (card, remaining) = match order.source(SourceKind::Stripe) {
            Some(source) => (source.reference.clone(), source.remaining()),
            None => return Err(SettlementError::MissingSource(number, SourceKind::Stripe)),
        };

        // The invariant is enforced before any money moves: cumulative
        // settlements never exceed the authorized amount.
        if amount > remaining {
            return Err(SettlementError::ExceedsAllocation {
                requested: amount,
                remaining,
            });
        }

        let request = ChargeRequest {
            amount: amount.minor_units(),
            currency: SETTLEMENT_CURRENCY.to_string(),
            card,
            description: format!("Settlement for order {}", number),
            api_key: self.config.stripe_api_key.clone(),
        };

        let charge = match self.gateway.create_charge(request).await {
            Ok(charge) => charge,
            Err(err) => {
                tracing::warn!(order = %number, %amount, error = %err, "settlement charge failed");
                order.add_note(format!("Attempt to settle {} failed: {}", amount, err));
                return Err(err.into());
            }
        };

        tracing::info!(order = %number, %amount, charge = %charge.id, "settlement charge succeeded");
        order.add_note(format!(
            "Payment of {} settled using reference '{}' from initial transaction",
            amount, charge.id
        ));

        let source = order
            .source_mut(SourceKind::Stripe)
            .ok_or_else(|| SettlementError::MissingSource(number, SourceKind::Stripe))?;
        source.debit(amount);

        let event = PaymentEvent::new(PaymentEventKind::Settle, amount, lines.to_vec(), charge.id);
        order.add_payment_event(event.clone());
        Ok(event)
    }

    /// Tax-inclusive amount owed for the shipped quantities. The order's
    /// shipping charge rides on the first settlement only.
    pub fn amount_to_settle(
        &self,
        order: &Order,
        lines: &[LineQuantity],
    ) -> Result<Money, SettlementError> {
        let mut amount = Money::ZERO;
        for shipped in lines {
            let line = order.line(shipped.line_id).ok_or_else(|| {
                SettlementError::UnknownLine(shipped.line_id, order.number.clone())
            })?;
            amount += line.unit_price_incl_tax * shipped.quantity;
        }

        // "First" means no settlement has been recorded yet. Two shipping
        // events racing through separate processes could both qualify;
        // serializing them is left to the surrounding transaction
        // boundary.
        if order.payment_event_count(PaymentEventKind::Settle) == 0 {
            amount += order.shipping_incl_tax;
        }
        Ok(amount)
    }
}

/// Card reference that makes [`MockPaymentGateway`] refuse the charge, the
/// same trigger token Stripe's test mode uses.
pub const DECLINE_CARD: &str = "tok_chargeDeclined";

/// Gateway double standing in for the Stripe client. Charges succeed with
/// sequential references; [`DECLINE_CARD`] triggers a card decline.
pub struct MockPaymentGateway {
    counter: AtomicUsize,
    pub charges: Mutex<Vec<ChargeRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            charges: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        if request.card == DECLINE_CARD {
            return Err(PaymentError::Declined("Your card was declined.".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let charge = Charge {
            id: format!("ch_{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
            created_at: chrono::Utc::now(),
        };
        self.charges.lock().unwrap().push(request);
        Ok(charge)
    }
}
