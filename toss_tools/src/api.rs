use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::*;
use market_common::Won;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
    Url,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{PaymentCancellation, PaymentConfirmation, TossApiError, TossConfig};

#[derive(Clone)]
pub struct TossApi {
    config: TossConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for TossApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TossApi({})", self.config.base_url)
    }
}

impl TossApi {
    pub fn new(config: TossConfig) -> Result<Self, TossApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let credentials = STANDARD.encode(format!("{}:", config.secret_key.reveal()));
        let val = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| TossApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TossApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &TossConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, TossApiError> {
        let url = self.url(path);
        trace!("🌐️ Sending REST query: {url}");
        let url =
            Url::parse(&url).map_err(|e| TossApiError::RestRequestError(format!("{url} is not a valid URL. {e}")))?;
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| TossApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| TossApiError::RestResponseError(e.to_string()))?;
        if !status.is_success() {
            let message = String::from_utf8_lossy(&bytes).to_string();
            return Err(TossApiError::QueryError { status: status.as_u16(), message });
        }
        trace!("🌐️ REST query successful. {status}");
        let text = String::from_utf8_lossy(&bytes);
        if text.trim().is_empty() || text.trim() == "null" {
            return Err(TossApiError::EmptyResponse);
        }
        serde_json::from_slice::<T>(&bytes).map_err(|e| TossApiError::JsonError(e.to_string()))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Asks the gateway to capture a payment the buyer has already authorized in the checkout widget.
    pub async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Won,
    ) -> Result<PaymentConfirmation, TossApiError> {
        let body = serde_json::json!({ "orderId": order_id, "amount": amount.value() });
        debug!("🌐️ Confirming payment for order {order_id} ({amount})");
        let result = self.rest_query::<PaymentConfirmation, _>(Method::POST, payment_key, Some(body)).await?;
        info!("🌐️ Gateway confirmed payment for order {order_id}. Status: {}", result.status);
        Ok(result)
    }

    pub async fn cancel_payment(&self, payment_key: &str, reason: &str) -> Result<PaymentCancellation, TossApiError> {
        let path = format!("{payment_key}/cancel");
        let body = serde_json::json!({ "cancelReason": reason });
        debug!("🌐️ Cancelling payment {payment_key}. Reason: {reason}");
        let result = self.rest_query::<PaymentCancellation, _>(Method::POST, &path, Some(body)).await?;
        info!("🌐️ Gateway cancelled payment for order {}. Status: {}", result.order_id, result.status);
        Ok(result)
    }
}
