//! Discount records and their applicability rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DiscountId, Price, ProductId};

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the price, clamped to 0-100.
    Percentage,
    /// `value` is subtracted from the price, never going below zero.
    FixedAmount,
}

/// A discount as returned by `GET /discount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    #[serde(alias = "_id")]
    pub id: DiscountId,
    pub code: String,
    pub kind: DiscountKind,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Products the discount is limited to; empty means store-wide.
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
}

impl Discount {
    /// Whether the discount is running at `at` (start inclusive, end exclusive).
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at < self.ends_at
    }

    /// Whether the discount covers `product`.
    #[must_use]
    pub fn covers(&self, product: &ProductId) -> bool {
        self.product_ids.is_empty() || self.product_ids.contains(product)
    }

    /// Price after applying the discount.
    #[must_use]
    pub fn apply(&self, price: Price) -> Price {
        match self.kind {
            DiscountKind::Percentage => {
                let pct = self.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let off = price.amount() * pct / Decimal::ONE_HUNDRED;
                Price::new(off.round_dp(2))
                    .map_or(price, |off| price.saturating_sub(off))
            }
            DiscountKind::FixedAmount => Price::new(self.value)
                .map_or(price, |off| price.saturating_sub(off)),
        }
    }
}

/// Input for `POST /discount`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscount {
    pub code: String,
    pub kind: DiscountKind,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<ProductId>,
}
