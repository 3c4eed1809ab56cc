//! Splitting a cart into per-seller orders.
//!
//! A cart may hold items from several sellers, but the backend places one
//! order per seller. [`split_by_seller`] groups the lines so the checkout
//! relay can submit them together.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, OrderId, Price, ProductId, SellerId};

/// A line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.times(self.quantity)
    }
}

/// Item within a [`SellerOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

/// All lines of one seller, relayed as a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrder {
    pub seller_id: SellerId,
    pub items: Vec<OrderItem>,
    pub subtotal: Price,
}

/// Errors raised while splitting a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// No line has a positive quantity.
    #[error("cart is empty")]
    EmptyCart,
    /// A total exceeded the decimal range.
    #[error("order total overflow for seller {0}")]
    Overflow(SellerId),
    /// The same product appears with two different unit prices.
    #[error("conflicting prices for product {0}")]
    ConflictingPrice(ProductId),
}

/// Group cart lines by seller.
///
/// Sellers appear in the order their first line appears in the cart.
/// Repeated lines for the same product are merged, and lines with a zero
/// quantity are dropped.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when nothing is left to order,
/// [`CheckoutError::ConflictingPrice`] when one product is listed at two
/// prices, and [`CheckoutError::Overflow`] if a subtotal cannot be
/// represented.
pub fn split_by_seller(lines: &[CartLine]) -> Result<Vec<SellerOrder>, CheckoutError> {
    let mut orders: Vec<SellerOrder> = Vec::new();

    for line in lines.iter().filter(|l| l.quantity > 0) {
        let index = match orders.iter().position(|o| o.seller_id == line.seller_id) {
            Some(index) => index,
            None => {
                orders.push(SellerOrder {
                    seller_id: line.seller_id.clone(),
                    items: Vec::new(),
                    subtotal: Price::ZERO,
                });
                orders.len() - 1
            }
        };
        let Some(order) = orders.get_mut(index) else {
            continue;
        };

        let line_total = line
            .line_total()
            .ok_or_else(|| CheckoutError::Overflow(line.seller_id.clone()))?;
        order.subtotal = order
            .subtotal
            .checked_add(line_total)
            .ok_or_else(|| CheckoutError::Overflow(line.seller_id.clone()))?;

        if let Some(item) = order
            .items
            .iter_mut()
            .find(|i| i.product_id == line.product_id)
        {
            if item.unit_price != line.unit_price {
                return Err(CheckoutError::ConflictingPrice(line.product_id.clone()));
            }
            item.quantity = item
                .quantity
                .checked_add(line.quantity)
                .ok_or_else(|| CheckoutError::Overflow(line.seller_id.clone()))?;
        } else {
            order.items.push(OrderItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }
    }

    if orders.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    Ok(orders)
}

/// Sum of all seller subtotals.
#[must_use]
pub fn grand_total(orders: &[SellerOrder]) -> Option<Price> {
    orders
        .iter()
        .try_fold(Price::ZERO, |acc, o| acc.checked_add(o.subtotal))
}

/// Body of `POST /order/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    pub orders: Vec<SellerOrder>,
}

/// Response of `POST /order/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_ids: Vec<OrderId>,
    /// Hosted payment page, when the backend requires one.
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: &str, seller: &str, cents: u32, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            name: product.to_uppercase(),
            unit_price: Price::from_cents(cents),
            quantity,
        }
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let lines = [
            line("p1", "s2", 1000, 1),
            line("p2", "s1", 500, 2),
            line("p3", "s2", 250, 4),
        ];

        let orders = split_by_seller(&lines).unwrap();
        let sellers: Vec<_> = orders.iter().map(|o| o.seller_id.as_str()).collect();
        assert_eq!(sellers, ["s2", "s1"]);

        let s2 = orders.first().unwrap();
        assert_eq!(s2.items.len(), 2);
        assert_eq!(s2.subtotal, Price::from_cents(2000));
        assert_eq!(orders.get(1).unwrap().subtotal, Price::from_cents(1000));
        assert_eq!(grand_total(&orders).unwrap(), Price::from_cents(3000));
    }

    #[test]
    fn test_merges_repeated_products() {
        let lines = [line("p1", "s1", 300, 1), line("p1", "s1", 300, 2)];
        let orders = split_by_seller(&lines).unwrap();
        let order = orders.first().unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items.first().unwrap().quantity, 3);
        assert_eq!(order.subtotal, Price::from_cents(900));
    }

    #[test]
    fn test_conflicting_price_is_rejected() {
        let lines = [line("p1", "s1", 300, 1), line("p1", "s1", 350, 1)];
        assert_eq!(
            split_by_seller(&lines),
            Err(CheckoutError::ConflictingPrice(ProductId::new("p1")))
        );
    }

    #[test]
    fn test_zero_quantity_lines_are_dropped() {
        let lines = [line("p1", "s1", 300, 0), line("p2", "s2", 100, 1)];
        let orders = split_by_seller(&lines).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders.first().unwrap().seller_id.as_str(), "s2");
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(split_by_seller(&[]), Err(CheckoutError::EmptyCart));
        assert_eq!(
            split_by_seller(&[line("p1", "s1", 100, 0)]),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_checkout_request_wire_shape() {
        let orders = split_by_seller(&[line("p1", "s1", 100, 2)]).unwrap();
        let request = CheckoutRequest {
            address_id: AddressId::new("a1"),
            orders,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["addressId"], "a1");
        assert_eq!(json["orders"][0]["sellerId"], "s1");
        assert_eq!(json["orders"][0]["items"][0]["productId"], "p1");
        assert_eq!(json["orders"][0]["items"][0]["quantity"], 2);
    }
}
