use merx_core::pii::Masked;
use std::collections::HashMap;
use std::fmt;

/// Form field carrying the client-side Stripe token.
pub const TOKEN_FIELD: &str = "stripeToken";

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Validation errors keyed by field, rendered back into the payment step.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid form submission")]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded against the given field.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

/// Validated client-side token, opaque to the rest of checkout.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentToken(Masked<String>);

impl PaymentToken {
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentToken(********)")
    }
}

/// The client-side payment token form.
///
/// Bound from raw POST fields. The token value is carried in memory only;
/// it never touches session or storage while checkout is still in flight.
#[derive(Debug, Clone, Default)]
pub struct StripeTokenForm {
    token: Option<Masked<String>>,
}

impl StripeTokenForm {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bind(fields: &HashMap<String, String>) -> Self {
        Self {
            token: fields.get(TOKEN_FIELD).map(|token| Masked::new(token.clone())),
        }
    }

    /// Raw token value, for re-rendering as a hidden field on the preview
    /// page.
    pub fn token_value(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.expose().as_str())
    }

    /// Server-side validation. Returns the opaque token, or the field
    /// errors to render.
    pub fn validate(&self) -> Result<PaymentToken, FormErrors> {
        match &self.token {
            Some(token) if !token.expose().trim().is_empty() => Ok(PaymentToken(token.clone())),
            _ => {
                let mut errors = FormErrors::default();
                errors.push(TOKEN_FIELD, "This field is required.");
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(token: &str) -> HashMap<String, String> {
        HashMap::from([(TOKEN_FIELD.to_string(), token.to_string())])
    }

    #[test]
    fn test_valid_token_passes() {
        let form = StripeTokenForm::bind(&fields("tok_visa"));
        let token = form.validate().unwrap();
        assert_eq!(token.expose(), "tok_visa");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let form = StripeTokenForm::bind(&HashMap::new());
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field(TOKEN_FIELD), Some("This field is required."));
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let form = StripeTokenForm::bind(&fields("   "));
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_debug_never_prints_the_token() {
        let form = StripeTokenForm::bind(&fields("tok_supersecret"));
        let debugged = format!("{:?}", form);
        assert!(!debugged.contains("tok_supersecret"));

        let token = form.validate().unwrap();
        assert!(!format!("{:?}", token).contains("tok_supersecret"));
    }
}
