//! Discount code operations.

use rust_decimal::Decimal;
use saleso_core::{Discount, DiscountId, DiscountKind, NewDiscount};
use serde::de::IgnoredAny;
use tracing::instrument;

use super::{SalesoClient, segment};
use crate::error::GatewayError;

impl SalesoClient {
    /// All discount codes visible to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn discounts(&self) -> Result<Vec<Discount>, GatewayError> {
        self.gateway().get("/discount").await
    }

    /// Create a discount code.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the discount is malformed,
    /// or the request error.
    #[instrument(skip(self, discount), fields(code = %discount.code))]
    pub async fn create_discount(&self, discount: &NewDiscount) -> Result<Discount, GatewayError> {
        validate_discount(discount)?;
        self.gateway().post("/discount", discount).await
    }

    /// Delete a discount code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(discount_id = %id))]
    pub async fn delete_discount(&self, id: &DiscountId) -> Result<(), GatewayError> {
        let path = format!("/discount/{}", segment(id.as_str()));
        let _: IgnoredAny = self.gateway().delete(&path).await?;
        Ok(())
    }
}

fn validate_discount(discount: &NewDiscount) -> Result<(), GatewayError> {
    let invalid = |msg: &str| Err(GatewayError::Validation(msg.to_string()));

    if discount.code.trim().is_empty() {
        return invalid("discount code is required");
    }
    if discount.value <= Decimal::ZERO {
        return invalid("discount value must be positive");
    }
    if discount.kind == DiscountKind::Percentage && discount.value > Decimal::ONE_HUNDRED {
        return invalid("percentage discount cannot exceed 100");
    }
    if discount.ends_at <= discount.starts_at {
        return invalid("discount must end after it starts");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn discount(kind: DiscountKind, value: i64) -> NewDiscount {
        let now = Utc::now();
        NewDiscount {
            code: "SPRING".to_string(),
            kind,
            value: Decimal::from(value),
            starts_at: now,
            ends_at: now + Duration::days(7),
            product_ids: Vec::new(),
        }
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&discount(DiscountKind::Percentage, 15)).is_ok());
        assert!(validate_discount(&discount(DiscountKind::FixedAmount, 500)).is_ok());
        assert!(validate_discount(&discount(DiscountKind::Percentage, 150)).is_err());
        assert!(validate_discount(&discount(DiscountKind::FixedAmount, 0)).is_err());
    }

    #[test]
    fn test_validate_discount_window() {
        let mut d = discount(DiscountKind::Percentage, 10);
        d.ends_at = d.starts_at;
        assert!(validate_discount(&d).is_err());

        d = discount(DiscountKind::Percentage, 10);
        d.code = "  ".to_string();
        assert!(validate_discount(&d).is_err());
    }
}
