//! Cart, stock ledger, checkout and order dispatch.
//!
//! The pure parts ([`Cart`], [`StockLedger`], [`build_order`],
//! [`OrderDispatcher`]) hold no I/O. [`ShopService`] wires them to the
//! catalog for the operations the HTTP layer exposes.

mod cart;
mod checkout;
mod dispatch;
mod error;
mod ledger;
mod service;

pub use cart::{Cart, CartLine, ProductSnapshot};
pub use checkout::{
    CustomerInfo, MINIMUM_ORDER_QUANTITY, OrderRecord, build_order, build_order_at, can_checkout,
};
pub use dispatch::{DEFAULT_CHANNEL_TEMPLATE, DispatchReceipt, OrderDispatcher};
pub use error::{CommerceError, CustomerField, positive_quantity};
pub use ledger::StockLedger;
pub use service::ShopService;
