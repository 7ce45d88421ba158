//! Site presentation settings.
//!
//! Stored as a single flat document. Two spellings of a few fields exist in
//! the wild (`logo` / `logoUrl`, `headerMessage` / `bannerMessage`); both are
//! accepted on read and the `logoUrl` / `bannerMessage` form is written.

use serde::{Deserialize, Serialize};

/// Presentation config and the outbound order recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(alias = "logo")]
    pub logo_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub text_color: String,
    pub background_color: String,
    pub accent_color: String,
    #[serde(alias = "headerMessage")]
    pub banner_message: String,
    /// Footer markup, rendered as-is by the client.
    pub footer_content: String,
    /// Messaging-app number that receives orders. Empty means unconfigured.
    pub whatsapp_number: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            primary_color: "#4a90e2".to_owned(),
            secondary_color: "#f8f9fa".to_owned(),
            text_color: "#333".to_owned(),
            background_color: "#fff".to_owned(),
            accent_color: "#e74c3c".to_owned(),
            banner_message: "Escolha seu produto e seu pedido será enviado via WhatsApp."
                .to_owned(),
            footer_content: "<p>Hellen Moda Fitness &copy; 2023</p>".to_owned(),
            whatsapp_number: String::new(),
        }
    }
}

impl SiteSettings {
    /// Digits of the order recipient, or `None` when no number is set.
    #[must_use]
    pub fn order_recipient(&self) -> Option<String> {
        let digits: String = self
            .whatsapp_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then_some(digits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: SiteSettings =
            serde_json::from_str(r##"{"primaryColor": "#ff6b6b"}"##).unwrap();
        assert_eq!(settings.primary_color, "#ff6b6b");
        assert_eq!(settings.accent_color, "#e74c3c");
        assert!(settings.whatsapp_number.is_empty());
    }

    #[test]
    fn test_legacy_field_spellings_are_accepted() {
        let settings: SiteSettings = serde_json::from_str(
            r#"{"logo": "https://cdn.example/logo.png", "headerMessage": "Oi"}"#,
        )
        .unwrap();
        assert_eq!(settings.logo_url, "https://cdn.example/logo.png");
        assert_eq!(settings.banner_message, "Oi");
    }

    #[test]
    fn test_order_recipient_keeps_digits_only() {
        let settings = SiteSettings {
            whatsapp_number: "+55 (11) 99999-9999".to_owned(),
            ..SiteSettings::default()
        };
        assert_eq!(settings.order_recipient().as_deref(), Some("5511999999999"));
        assert_eq!(SiteSettings::default().order_recipient(), None);
    }
}
