//! JSON bodies emitted by the gateway itself.

use serde::{Deserialize, Serialize};

/// Uniform error body produced by the error boundary.
///
/// `stack` is only populated outside production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Body of `GET /api/config/paypal`.
///
/// An unset client ID serializes as `{}`, matching what browsers already
/// receive from the storefront when PayPal is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalConfigResponse {
    #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_missing_stack() {
        let envelope = ErrorEnvelope {
            message: "Server Error".to_string(),
            stack: None,
        };
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"message":"Server Error"}"#
        );
    }

    #[test]
    fn test_paypal_config_uses_camel_case_key() {
        let body = PaypalConfigResponse {
            client_id: Some("sb-client".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"clientId":"sb-client"}"#
        );

        let unset = PaypalConfigResponse { client_id: None };
        assert_eq!(serde_json::to_string(&unset).unwrap(), "{}");
    }
}
