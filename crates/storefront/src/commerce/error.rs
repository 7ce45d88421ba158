//! Error kinds for cart, stock and checkout operations.

use thiserror::Error;
use vitrine_core::ProductId;

use crate::catalog::CatalogError;

/// A customer form field that checkout validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    Name,
    Phone,
    Cep,
    Address,
    DeliveryType,
    PaymentMethod,
}

impl CustomerField {
    /// Label used in messages shown to the shopper.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Nome completo",
            Self::Phone => "Telefone",
            Self::Cep => "CEP",
            Self::Address => "Endereço",
            Self::DeliveryType => "Tipo de entrega",
            Self::PaymentMethod => "Forma de pagamento",
        }
    }
}

impl std::fmt::Display for CustomerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Cep => "cep",
            Self::Address => "address",
            Self::DeliveryType => "delivery_type",
            Self::PaymentMethod => "payment_method",
        };
        f.write_str(name)
    }
}

/// Errors raised by the cart, the stock ledger and checkout.
///
/// Validation errors are raised before any state is touched, so a failed
/// operation always leaves the cart exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommerceError {
    /// Quantity was zero, negative or out of range.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// No cart line matches the product/colour pair.
    #[error("cart line not found: {product_id} ({color})")]
    LineNotFound { product_id: ProductId, color: String },

    /// The product does not exist or is inactive.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product exists but has no such colour.
    #[error("color not found: {product_id} ({color})")]
    ColorNotFound { product_id: ProductId, color: String },

    /// Checkout attempted with no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout attempted below the minimum order quantity.
    #[error("order has {item_count} items, minimum is {minimum}")]
    BelowMinimum { item_count: u64, minimum: u64 },

    /// Requested more units than this session can still reserve.
    #[error("insufficient stock for {product_id} ({color}): requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        color: String,
        requested: u64,
        available: u32,
    },

    /// A required customer field was blank.
    #[error("missing field: {0}")]
    MissingField(CustomerField),

    /// A customer field was present but malformed.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        field: CustomerField,
        reason: &'static str,
    },

    /// No order recipient is configured in the site settings.
    #[error("order channel recipient is not configured")]
    ChannelUnconfigured,

    /// The catalog, stock or settings collaborator failed.
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),
}

impl CommerceError {
    /// Whether the shopper can fix this by changing their input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity { .. }
                | Self::LineNotFound { .. }
                | Self::EmptyCart
                | Self::BelowMinimum { .. }
                | Self::InsufficientStock { .. }
                | Self::MissingField(_)
                | Self::InvalidField { .. }
        )
    }

    /// Actionable message for the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuantity { .. } => "Quantidade deve ser pelo menos 1.".to_owned(),
            Self::LineNotFound { .. } => "Este item não está mais no carrinho.".to_owned(),
            Self::ProductNotFound(_) => "Produto não encontrado.".to_owned(),
            Self::ColorNotFound { .. } => "Por favor, selecione uma cor disponível.".to_owned(),
            Self::EmptyCart => "Seu carrinho está vazio!".to_owned(),
            Self::BelowMinimum { item_count, minimum } => format!(
                "Pedido mínimo de {minimum} peças não atingido (você tem {item_count})."
            ),
            Self::InsufficientStock { available, .. } => format!(
                "Estoque insuficiente para a quantidade selecionada (disponível: {available})."
            ),
            Self::MissingField(field) => format!("Preencha o campo {}.", field.label()),
            Self::InvalidField { field, reason } => format!("{} inválido: {reason}.", field.label()),
            Self::ChannelUnconfigured => {
                "Não foi possível enviar o pedido agora. Tente novamente mais tarde.".to_owned()
            }
            Self::RemoteUnavailable(_) => {
                "Erro ao consultar a loja. Tente novamente.".to_owned()
            }
        }
    }
}

impl From<CatalogError> for CommerceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::ProductNotFound(id),
            other => Self::RemoteUnavailable(other.to_string()),
        }
    }
}

/// Convert a signed quantity from the API boundary into a positive count.
///
/// # Errors
///
/// Returns `InvalidQuantity` for zero, negative, or values above `u32::MAX`.
pub fn positive_quantity(quantity: i64) -> Result<u32, CommerceError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(CommerceError::InvalidQuantity { quantity })
}
