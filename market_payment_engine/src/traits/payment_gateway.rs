use log::*;
use market_common::Won;
use toss_tools::{PaymentCancellation, PaymentConfirmation, TossApi};

use crate::MarketplaceError;

/// The two calls the payment flow makes to the card-payment provider. Implementations report every failure
/// (transport, non-2xx status, empty or undecodable body, timeout) as [`MarketplaceError::ExternalServiceError`].
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient: Clone {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Won,
    ) -> Result<PaymentConfirmation, MarketplaceError>;

    async fn cancel_payment(
        &self,
        payment_key: &str,
        cancel_reason: &str,
    ) -> Result<PaymentCancellation, MarketplaceError>;
}

impl PaymentGatewayClient for TossApi {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: Won,
    ) -> Result<PaymentConfirmation, MarketplaceError> {
        TossApi::confirm_payment(self, payment_key, order_id, amount).await.map_err(|e| {
            error!("🌐️ Confirmation of order {order_id} failed at the gateway. {e}");
            MarketplaceError::from(e)
        })
    }

    async fn cancel_payment(
        &self,
        payment_key: &str,
        cancel_reason: &str,
    ) -> Result<PaymentCancellation, MarketplaceError> {
        TossApi::cancel_payment(self, payment_key, cancel_reason).await.map_err(|e| {
            error!("🌐️ Cancellation of payment {payment_key} failed at the gateway. {e}");
            MarketplaceError::from(e)
        })
    }
}
