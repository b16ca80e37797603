pub mod gateway;
pub mod money;
pub mod order;
pub mod payment;
pub mod pii;
pub mod reference;

pub use money::Money;
pub use order::{Line, LineQuantity, Order, OrderNote, ShippingEvent};
pub use payment::{PaymentError, PaymentEvent, PaymentSource};
pub use reference::{PaymentEventKind, ShippingEventKind, SourceKind};
