use crate::forms::{FormErrors, PaymentToken, StripeTokenForm};
use crate::pipeline::{
    OrderPipeline, OrderSubmission, OrderTotal, PaymentHandler, PaymentUpdate, PlacedOrder,
    SubmissionError, STRIPE_PAYMENT_ARG,
};
use async_trait::async_trait;
use merx_core::pii::Masked;
use merx_core::reference::{PaymentEventKind, SourceKind};
use merx_core::{PaymentError, PaymentEvent, PaymentSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Form action submitted by the "place order" button on the preview page.
pub const PLACE_ORDER_ACTION: &str = "place_order";

/// Redirect target when a confirm submission fails validation.
pub const PAYMENT_DETAILS_URL: &str = "checkout:payment-details";

/// Raw POST for the payment-details step.
#[derive(Debug, Clone, Default)]
pub struct PaymentDetailsRequest {
    pub action: Option<String>,
    pub fields: HashMap<String, String>,
}

impl PaymentDetailsRequest {
    fn is_place_order(&self) -> bool {
        self.action.as_deref() == Some(PLACE_ORDER_ACTION)
    }
}

/// Template context for the payment-details step.
#[derive(Debug, Clone, Default)]
pub struct PaymentStepContext {
    pub stripe_form: Option<StripeTokenForm>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a payment-details submission, for the surrounding view layer
/// to render.
#[derive(Debug)]
pub enum StepOutcome {
    /// Re-render the payment step; the form carries field errors.
    RenderPayment {
        form: StripeTokenForm,
        errors: FormErrors,
    },
    /// Render the preview step with the validated form carried hidden.
    RenderPreview { form: StripeTokenForm },
    /// Redirect back to the payment step with a user-facing message.
    RedirectToPayment {
        url: &'static str,
        message: String,
    },
    /// The order was submitted.
    Placed(PlacedOrder),
}

/// Payment-details step of checkout, composed over the generic submission
/// pipeline instead of subclassing it.
pub struct PaymentDetailsHandler {
    pipeline: Arc<dyn OrderPipeline>,
}

impl PaymentDetailsHandler {
    pub fn new(pipeline: Arc<dyn OrderPipeline>) -> Self {
        Self { pipeline }
    }

    /// Ensure the token form is present in the render context. Persisted
    /// state is untouched.
    pub fn payment_context(&self, ctx: &mut PaymentStepContext) {
        if ctx.stripe_form.is_none() {
            ctx.stripe_form = Some(StripeTokenForm::empty());
        }
    }

    /// Dispatch a payment-details POST.
    pub async fn handle_submit(
        &self,
        request: &PaymentDetailsRequest,
    ) -> Result<StepOutcome, SubmissionError> {
        if request.is_place_order() {
            return self.place_order(request).await;
        }

        let form = StripeTokenForm::bind(&request.fields);
        match form.validate() {
            Err(errors) => Ok(StepOutcome::RenderPayment { form, errors }),
            // The token rides to the preview page inside the form; nothing
            // is written to session or storage until the order is
            // confirmed.
            Ok(_) => Ok(StepOutcome::RenderPreview { form }),
        }
    }

    async fn place_order(
        &self,
        request: &PaymentDetailsRequest,
    ) -> Result<StepOutcome, SubmissionError> {
        // Re-validate what came back with the confirm POST. A failure here
        // means the preview payload was tampered with, so the message
        // stays deliberately vague.
        let form = StripeTokenForm::bind(&request.fields);
        let token = match form.validate() {
            Ok(token) => token,
            Err(_) => {
                return Ok(StepOutcome::RedirectToPayment {
                    url: PAYMENT_DETAILS_URL,
                    message: "Invalid submission".to_string(),
                })
            }
        };

        let submission = self.build_submission(&token);
        let placed = self.pipeline.submit(submission, self).await?;
        tracing::info!(order_number = %placed.order_number, "order submitted");
        Ok(StepOutcome::Placed(placed))
    }

    /// Extend the pipeline's base submission with the validated token.
    pub fn build_submission(&self, token: &PaymentToken) -> OrderSubmission {
        let mut submission = self.pipeline.build_submission();
        submission.payment_args.insert(
            STRIPE_PAYMENT_ARG.to_string(),
            Masked::new(token.expose().to_string()),
        );
        submission
    }
}

#[async_trait]
impl PaymentHandler for PaymentDetailsHandler {
    /// Record the pre-auth obtained when the client created the token. No
    /// charge is executed at checkout; the hold already exists processor
    /// side, so only the source and its audit event are recorded.
    async fn handle_payment(
        &self,
        _order_number: &str,
        total: &OrderTotal,
        payment_args: &HashMap<String, Masked<String>>,
    ) -> Result<PaymentUpdate, PaymentError> {
        let token = payment_args
            .get(STRIPE_PAYMENT_ARG)
            .ok_or(PaymentError::MissingToken)?;

        let source = PaymentSource::pre_auth(
            SourceKind::Stripe,
            total.currency.clone(),
            total.incl_tax,
            token.expose().clone(),
        );
        let event = PaymentEvent::new(
            PaymentEventKind::PreAuth,
            total.incl_tax,
            Vec::new(),
            token.expose().clone(),
        );

        Ok(PaymentUpdate {
            sources: vec![source],
            events: vec![event],
        })
    }
}
