//! Order message formatting and hand-off to the messaging channel.
//!
//! The message layout is parsed by whoever receives orders on the other end,
//! so field order, labels and punctuation are fixed.

use std::fmt::Write as _;

use chrono::FixedOffset;
use serde::Serialize;
use vitrine_core::format_amount;

use super::cart::Cart;
use super::checkout::OrderRecord;
use super::error::CommerceError;

/// Default deep link for the messaging app.
pub const DEFAULT_CHANNEL_TEMPLATE: &str = "https://wa.me/{recipient}?text={message}";

const RECIPIENT_PLACEHOLDER: &str = "{recipient}";
const MESSAGE_PLACEHOLDER: &str = "{message}";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Outcome of a dispatched order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    /// Deep link the shopper is sent to.
    pub redirect_url: String,
    /// Plain-text message embedded in the link.
    pub message: String,
    /// Stock decrements that failed after dispatch (logged, not retried).
    pub stock_sync_failures: usize,
}

/// Formats orders and builds the channel link.
#[derive(Debug, Clone)]
pub struct OrderDispatcher {
    store_name: String,
    link_template: String,
    utc_offset: FixedOffset,
}

impl OrderDispatcher {
    #[must_use]
    pub fn new(
        store_name: impl Into<String>,
        link_template: impl Into<String>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            store_name: store_name.into(),
            link_template: link_template.into(),
            utc_offset,
        }
    }

    /// Render the order as the outbound message text.
    #[must_use]
    pub fn format_message(&self, order: &OrderRecord) -> String {
        let customer = &order.customer;
        let mut message = format!("*NOVO PEDIDO - {}*\n\n", self.store_name.to_uppercase());

        // Writing to a String cannot fail.
        let _ = writeln!(message, "*Cliente:* {}", customer.name);
        let _ = writeln!(message, "*Telefone:* {}", customer.phone);
        let _ = writeln!(message, "*CEP:* {}", customer.cep);
        let _ = writeln!(message, "*Endereço:* {}", customer.address);
        let _ = writeln!(message, "*Tipo de Entrega:* {}", customer.delivery_type);
        let _ = writeln!(
            message,
            "*Forma de Pagamento:* {}\n",
            customer.payment_method.to_uppercase()
        );

        message.push_str("*ITENS DO PEDIDO:*\n");
        for item in &order.items {
            let _ = writeln!(
                message,
                "- {} ({}) x{} - R$ {}",
                item.name,
                item.color,
                item.quantity,
                format_amount(item.line_total())
            );
        }

        let _ = write!(message, "\n*TOTAL: R$ {}*\n\n", format_amount(order.total));

        if !customer.notes.is_empty() {
            let _ = write!(message, "*Observações:* {}\n\n", customer.notes);
        }

        let local_time = order.timestamp.with_timezone(&self.utc_offset);
        let _ = write!(
            message,
            "Pedido realizado em: {}",
            local_time.format(TIMESTAMP_FORMAT)
        );

        message
    }

    /// Embed an already formatted message into the channel deep link.
    #[must_use]
    pub fn channel_uri(&self, recipient: &str, message: &str) -> String {
        self.link_template
            .replace(RECIPIENT_PLACEHOLDER, recipient)
            .replace(MESSAGE_PLACEHOLDER, &urlencoding::encode(message))
    }

    /// Build the channel link for `order` and clear the cart.
    ///
    /// There is no delivery confirmation: once the link is built and the cart
    /// cleared, the order counts as dispatched.
    ///
    /// # Errors
    ///
    /// Returns `ChannelUnconfigured` when `recipient` is `None`; the cart is
    /// left untouched in that case.
    pub fn dispatch(
        &self,
        order: &OrderRecord,
        recipient: Option<&str>,
        cart: &mut Cart,
    ) -> Result<DispatchReceipt, CommerceError> {
        let recipient = recipient.ok_or(CommerceError::ChannelUnconfigured)?;
        let message = self.format_message(order);
        let redirect_url = self.channel_uri(recipient, &message);

        cart.clear();
        tracing::info!(
            items = order.items.len(),
            total = %order.total,
            "order dispatched to messaging channel"
        );

        Ok(DispatchReceipt {
            redirect_url,
            message,
            stock_sync_failures: 0,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use vitrine_core::ProductId;

    use super::*;
    use crate::commerce::cart::ProductSnapshot;
    use crate::commerce::checkout::{build_order_at, tests::customer};

    fn dispatcher() -> OrderDispatcher {
        OrderDispatcher::new(
            "Hellen Moda Fitness",
            DEFAULT_CHANNEL_TEMPLATE,
            FixedOffset::west_opt(3 * 3600).unwrap(),
        )
    }

    fn cart_with(lines: &[(&str, &str, &str, u32, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (id, name, color, quantity, price) in lines {
            cart.add(
                &ProductId::new(*id),
                color,
                *quantity,
                ProductSnapshot {
                    name: (*name).to_owned(),
                    price: Decimal::new(*price, 0),
                    image: String::new(),
                },
            )
            .unwrap();
        }
        cart
    }

    fn order_for(cart: &Cart, notes: &str) -> OrderRecord {
        let info = crate::commerce::checkout::CustomerInfo {
            notes: notes.to_owned(),
            ..customer()
        };
        let when = Utc.with_ymd_and_hms(2026, 10, 18, 17, 4, 5).unwrap();
        build_order_at(cart, &info, when).unwrap()
    }

    #[test]
    fn test_item_and_total_lines() {
        let cart = cart_with(&[
            ("p1", "Top X", "Rosa", 2, 15),
            ("p2", "Short Y", "Preto", 8, 10),
        ]);
        let mut order = order_for(&cart, "");
        order.items.truncate(1);
        order.total = Decimal::new(30, 0);

        let message = dispatcher().format_message(&order);
        assert!(message.lines().any(|l| l == "- Top X (Rosa) x2 - R$ 30.00"));
        assert!(message.lines().any(|l| l == "*TOTAL: R$ 30.00*"));
    }

    #[test]
    fn test_full_message_layout() {
        let cart = cart_with(&[
            ("p1", "Conjunto A", "Azul", 3, 20),
            ("p2", "Short B", "Preto", 7, 10),
        ]);
        let order = order_for(&cart, "");

        let expected = "*NOVO PEDIDO - HELLEN MODA FITNESS*\n\n\
*Cliente:* Maria Silva\n\
*Telefone:* 11 99999-0000\n\
*CEP:* 01310-100\n\
*Endereço:* Av. Paulista, 1000\n\
*Tipo de Entrega:* transportadora\n\
*Forma de Pagamento:* PIX\n\n\
*ITENS DO PEDIDO:*\n\
- Conjunto A (Azul) x3 - R$ 60.00\n\
- Short B (Preto) x7 - R$ 70.00\n\n\
*TOTAL: R$ 130.00*\n\n\
Pedido realizado em: 18/10/2026, 14:04:05";

        assert_eq!(dispatcher().format_message(&order), expected);
    }

    #[test]
    fn test_notes_block_only_when_present() {
        let cart = cart_with(&[("p1", "Top X", "Rosa", 10, 15)]);

        let without = dispatcher().format_message(&order_for(&cart, ""));
        assert!(!without.contains("Observações"));

        let with = dispatcher().format_message(&order_for(&cart, "Entregar após 18h"));
        assert!(with.contains("*TOTAL: R$ 150.00*\n\n*Observações:* Entregar após 18h\n\nPedido realizado em:"));
    }

    #[test]
    fn test_channel_uri_encodes_message() {
        let uri = dispatcher().channel_uri("5511999999999", "*Oi* & tchau\n");
        assert_eq!(
            uri,
            "https://wa.me/5511999999999?text=%2AOi%2A%20%26%20tchau%0A"
        );
    }

    #[test]
    fn test_dispatch_clears_cart() {
        let mut cart = cart_with(&[("p1", "Top X", "Rosa", 10, 15)]);
        let order = order_for(&cart, "");

        let receipt = dispatcher()
            .dispatch(&order, Some("5511999999999"), &mut cart)
            .unwrap();

        assert!(cart.lines().is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(receipt.redirect_url.starts_with("https://wa.me/5511999999999?text="));
        assert_eq!(receipt.message, dispatcher().format_message(&order));
    }

    #[test]
    fn test_dispatch_without_recipient_keeps_cart() {
        let mut cart = cart_with(&[("p1", "Top X", "Rosa", 10, 15)]);
        let order = order_for(&cart, "");

        let err = dispatcher().dispatch(&order, None, &mut cart).unwrap_err();
        assert_eq!(err, CommerceError::ChannelUnconfigured);
        assert_eq!(cart.item_count(), 10);
    }
}
