use crate::money::Money;
use crate::payment::{PaymentEvent, PaymentSource};
use crate::reference::{PaymentEventKind, ShippingEventKind, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order line eligible for partial shipment and partial settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: Uuid,
    pub sku: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_incl_tax: Money,
}

impl Line {
    pub fn new(
        sku: impl Into<String>,
        description: impl Into<String>,
        quantity: u32,
        unit_price_incl_tax: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sku: sku.into(),
            description: description.into(),
            quantity,
            unit_price_incl_tax,
        }
    }
}

/// Shipped portion of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantity {
    pub line_id: Uuid,
    pub quantity: u32,
}

impl LineQuantity {
    pub fn new(line_id: Uuid, quantity: u32) -> Self {
        Self { line_id, quantity }
    }
}

/// Free-form note attached to an order for operators to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Record of a shipment action, optionally linked to the payment event
/// produced alongside it. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingEvent {
    pub id: Uuid,
    pub kind: ShippingEventKind,
    pub lines: Vec<LineQuantity>,
    /// Caller-supplied reference, e.g. a courier tracking number.
    pub reference: Option<String>,
    pub payment_event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ShippingEvent {
    pub fn new(
        kind: ShippingEventKind,
        lines: Vec<LineQuantity>,
        reference: Option<String>,
        payment_event_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            lines,
            reference,
            payment_event_id,
            created_at: Utc::now(),
        }
    }
}

/// The single source of truth for a customer's purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub number: String,
    pub currency: String,
    pub lines: Vec<Line>,
    pub shipping_incl_tax: Money,
    pub total_incl_tax: Money,
    pub sources: Vec<PaymentSource>,
    pub payment_events: Vec<PaymentEvent>,
    pub shipping_events: Vec<ShippingEvent>,
    pub notes: Vec<OrderNote>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        number: impl Into<String>,
        currency: impl Into<String>,
        lines: Vec<Line>,
        shipping_incl_tax: Money,
    ) -> Self {
        let total_incl_tax = lines
            .iter()
            .map(|line| line.unit_price_incl_tax * line.quantity)
            .sum::<Money>()
            + shipping_incl_tax;

        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            currency: currency.into(),
            lines,
            shipping_incl_tax,
            total_incl_tax,
            sources: Vec::new(),
            payment_events: Vec::new(),
            shipping_events: Vec::new(),
            notes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn line(&self, id: Uuid) -> Option<&Line> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Payment source of the given type, if one was recorded at checkout.
    pub fn source(&self, kind: SourceKind) -> Option<&PaymentSource> {
        self.sources.iter().find(|source| source.kind == kind)
    }

    pub fn source_mut(&mut self, kind: SourceKind) -> Option<&mut PaymentSource> {
        self.sources.iter_mut().find(|source| source.kind == kind)
    }

    pub fn add_payment_source(&mut self, source: PaymentSource) {
        self.sources.push(source);
    }

    pub fn add_payment_event(&mut self, event: PaymentEvent) {
        self.payment_events.push(event);
    }

    pub fn add_shipping_event(&mut self, event: ShippingEvent) {
        self.shipping_events.push(event);
    }

    pub fn add_note(&mut self, message: impl Into<String>) {
        self.notes.push(OrderNote {
            id: Uuid::new_v4(),
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    /// Number of recorded payment events of the given kind.
    pub fn payment_event_count(&self, kind: PaymentEventKind) -> usize {
        self.payment_events.iter().filter(|event| event.kind == kind).count()
    }

    /// Total captured so far across all settlement events.
    pub fn settled_total(&self) -> Money {
        self.payment_events
            .iter()
            .filter(|event| event.kind == PaymentEventKind::Settle)
            .map(|event| event.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            "100017",
            "EUR",
            vec![Line::new("SKU-1", "Wool blanket", 2, Money::new(45, 0))],
            Money::new(10, 0),
        )
    }

    #[test]
    fn test_total_includes_shipping() {
        let order = sample_order();
        assert_eq!(order.total_incl_tax, Money::new(100, 0));
    }

    #[test]
    fn test_source_lookup_by_kind() {
        let mut order = sample_order();
        assert!(order.source(SourceKind::Stripe).is_none());

        order.add_payment_source(PaymentSource::pre_auth(
            SourceKind::Stripe,
            "eur",
            order.total_incl_tax,
            "tok_visa",
        ));

        let source = order.source(SourceKind::Stripe).unwrap();
        assert_eq!(source.amount_allocated, Money::new(100, 0));
    }

    #[test]
    fn test_settled_total_counts_settle_events_only() {
        let mut order = sample_order();
        order.add_payment_event(PaymentEvent::new(
            PaymentEventKind::PreAuth,
            Money::new(100, 0),
            Vec::new(),
            "tok_visa",
        ));
        order.add_payment_event(PaymentEvent::new(
            PaymentEventKind::Settle,
            Money::new(55, 0),
            Vec::new(),
            "ch_1",
        ));

        assert_eq!(order.settled_total(), Money::new(55, 0));
        assert_eq!(order.payment_event_count(PaymentEventKind::Settle), 1);
        assert_eq!(order.payment_event_count(PaymentEventKind::PreAuth), 1);
    }

    #[test]
    fn test_notes_are_appended() {
        let mut order = sample_order();
        order.add_note("Attempt to settle 45.00 failed: card declined");
        assert_eq!(order.notes.len(), 1);
        assert!(order.notes[0].message.starts_with("Attempt to settle"));
    }
}
