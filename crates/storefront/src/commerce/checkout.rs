//! Checkout gating and order snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{Cart, CartLine};
use super::error::{CommerceError, CustomerField};

/// Units a cart must hold before it can be submitted.
pub const MINIMUM_ORDER_QUANTITY: u64 = 10;

const CEP_DIGITS: usize = 8;

fn default_payment_method() -> String {
    "pix".to_owned()
}

/// Delivery and contact details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub cep: String,
    pub address: String,
    /// Delivery option picked by the shopper (e.g. `transportadora`, `uber`).
    pub delivery_type: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub notes: String,
}

impl CustomerInfo {
    /// Trim every field and check the required ones.
    ///
    /// The CEP is reformatted as `NNNNN-NNN`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for the first blank required field, or
    /// `InvalidField` if the CEP does not have eight digits.
    pub fn validated(&self) -> Result<Self, CommerceError> {
        let required = [
            (CustomerField::Name, &self.name),
            (CustomerField::Phone, &self.phone),
            (CustomerField::Cep, &self.cep),
            (CustomerField::Address, &self.address),
            (CustomerField::DeliveryType, &self.delivery_type),
            (CustomerField::PaymentMethod, &self.payment_method),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CommerceError::MissingField(*field));
        }

        Ok(Self {
            name: self.name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            cep: normalize_cep(&self.cep)?,
            address: self.address.trim().to_owned(),
            delivery_type: self.delivery_type.trim().to_owned(),
            payment_method: self.payment_method.trim().to_owned(),
            notes: self.notes.trim().to_owned(),
        })
    }
}

fn normalize_cep(raw: &str) -> Result<String, CommerceError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != CEP_DIGITS {
        return Err(CommerceError::InvalidField {
            field: CustomerField::Cep,
            reason: "deve ter 8 dígitos",
        });
    }
    let (prefix, suffix) = digits.split_at(5);
    Ok(format!("{prefix}-{suffix}"))
}

/// Snapshot of a cart at submission time. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub customer: CustomerInfo,
    pub timestamp: DateTime<Utc>,
}

impl OrderRecord {
    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Whether the cart meets the minimum order quantity.
#[must_use]
pub fn can_checkout(cart: &Cart) -> bool {
    cart.item_count() >= MINIMUM_ORDER_QUANTITY
}

/// Validate the cart and customer details and snapshot them as an order.
///
/// # Errors
///
/// Returns `EmptyCart`, `BelowMinimum`, `MissingField` or `InvalidField`.
pub fn build_order(cart: &Cart, customer: &CustomerInfo) -> Result<OrderRecord, CommerceError> {
    build_order_at(cart, customer, Utc::now())
}

/// [`build_order`] with an explicit submission instant.
///
/// # Errors
///
/// Same as [`build_order`].
pub fn build_order_at(
    cart: &Cart,
    customer: &CustomerInfo,
    timestamp: DateTime<Utc>,
) -> Result<OrderRecord, CommerceError> {
    if cart.is_empty() {
        return Err(CommerceError::EmptyCart);
    }
    if !can_checkout(cart) {
        return Err(CommerceError::BelowMinimum {
            item_count: cart.item_count(),
            minimum: MINIMUM_ORDER_QUANTITY,
        });
    }
    let customer = customer.validated()?;

    Ok(OrderRecord {
        items: cart.lines().to_vec(),
        total: cart.total(),
        customer,
        timestamp,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use vitrine_core::ProductId;

    use super::*;
    use crate::commerce::cart::ProductSnapshot;

    pub(crate) fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Maria Silva".to_owned(),
            phone: "11 99999-0000".to_owned(),
            cep: "01310100".to_owned(),
            address: "Av. Paulista, 1000".to_owned(),
            delivery_type: "transportadora".to_owned(),
            payment_method: "pix".to_owned(),
            notes: String::new(),
        }
    }

    fn add(cart: &mut Cart, id: &str, color: &str, quantity: u32, price: i64) {
        cart.add(
            &ProductId::new(id),
            color,
            quantity,
            ProductSnapshot {
                name: id.to_owned(),
                price: Decimal::new(price, 0),
                image: String::new(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_minimum_gate_boundary() {
        let mut cart = Cart::new();
        add(&mut cart, "p1", "Azul", 9, 10);
        assert!(!can_checkout(&cart));

        let err = build_order(&cart, &customer()).unwrap_err();
        assert_eq!(
            err,
            CommerceError::BelowMinimum {
                item_count: 9,
                minimum: 10
            }
        );

        add(&mut cart, "p1", "Azul", 1, 10);
        assert!(can_checkout(&cart));
    }

    #[test]
    fn test_empty_cart_is_rejected_first() {
        let cart = Cart::new();
        assert_eq!(
            build_order(&cart, &customer()).unwrap_err(),
            CommerceError::EmptyCart
        );
    }

    #[test]
    fn test_two_line_scenario_builds_order() {
        let mut cart = Cart::new();
        add(&mut cart, "p1", "Azul", 3, 20);
        add(&mut cart, "p2", "Preto", 7, 10);

        let order = build_order(&cart, &customer()).unwrap();
        assert_eq!(order.total, Decimal::new(130, 0));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.item_count(), 10);
        assert_eq!(order.customer.cep, "01310-100");
    }

    #[test]
    fn test_order_is_a_deep_copy() {
        let mut cart = Cart::new();
        add(&mut cart, "p1", "Azul", 10, 20);
        let order = build_order(&cart, &customer()).unwrap();

        cart.update_quantity(&ProductId::new("p1"), "Azul", 1)
            .unwrap();
        cart.clear();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items.first().map(|i| i.quantity), Some(10));
        assert_eq!(order.total, Decimal::new(200, 0));
    }

    #[test]
    fn test_blank_field_is_missing() {
        let mut cart = Cart::new();
        add(&mut cart, "p1", "Azul", 10, 20);
        let info = CustomerInfo {
            address: "   ".to_owned(),
            ..customer()
        };
        assert_eq!(
            build_order(&cart, &info).unwrap_err(),
            CommerceError::MissingField(CustomerField::Address)
        );
    }

    #[test]
    fn test_malformed_cep_is_invalid() {
        let info = CustomerInfo {
            cep: "0131-01".to_owned(),
            ..customer()
        };
        assert!(matches!(
            info.validated(),
            Err(CommerceError::InvalidField {
                field: CustomerField::Cep,
                ..
            })
        ));
    }

    #[test]
    fn test_payment_method_defaults_to_pix() {
        let info: CustomerInfo = serde_json::from_str(
            r#"{"name":"A","phone":"1","cep":"01310100","address":"Rua","delivery_type":"uber"}"#,
        )
        .unwrap();
        assert_eq!(info.payment_method, "pix");
        assert!(info.notes.is_empty());
    }
}
