pub mod forms;
pub mod handler;
pub mod pipeline;

pub use forms::{FormErrors, PaymentToken, StripeTokenForm};
pub use handler::{PaymentDetailsHandler, PaymentDetailsRequest, PaymentStepContext, StepOutcome};
pub use pipeline::{
    OrderPipeline, OrderSubmission, OrderTotal, PaymentHandler, PaymentUpdate, PlacedOrder,
    SubmissionError,
};
