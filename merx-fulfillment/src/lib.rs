pub mod app_config;
pub mod handler;

pub use app_config::{SettlementConfig, SETTLEMENT_CURRENCY};
pub use handler::{FulfillmentPipeline, SettlementError, ShippingEventHandler};
