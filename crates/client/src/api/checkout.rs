//! Multi-seller checkout.

use saleso_core::AddressId;
use saleso_core::checkout::{CartLine, CheckoutRequest, CheckoutResponse, split_by_seller};
use tracing::{info, instrument};

use super::SalesoClient;
use crate::error::GatewayError;

impl SalesoClient {
    /// Split the cart into one order per seller and submit it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for an empty or inconsistent
    /// cart (no request is made), or the request error.
    #[instrument(skip(self, lines), fields(lines = lines.len(), address_id = %address_id))]
    pub async fn checkout(
        &self,
        lines: &[CartLine],
        address_id: &AddressId,
    ) -> Result<CheckoutResponse, GatewayError> {
        let orders = split_by_seller(lines).map_err(|e| GatewayError::Validation(e.to_string()))?;

        let request = CheckoutRequest {
            address_id: address_id.clone(),
            orders,
        };
        let response: CheckoutResponse = self.gateway().post("/order/checkout", &request).await?;
        info!(
            sellers = request.orders.len(),
            orders = response.order_ids.len(),
            "Checkout submitted"
        );

        Ok(response)
    }
}
