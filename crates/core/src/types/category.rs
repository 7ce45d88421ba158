//! Product categories.
//!
//! The catalog stores categories as lowercase strings. Known values map to
//! named variants; anything else is preserved verbatim in [`Category::Other`]
//! so that a product created with a new category still round-trips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keyword used by the storefront menu to mean "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Conjuntos,
    Macaquinhos,
    Tops,
    Shorts,
    /// A category not known to this build.
    Other(String),
}

impl Category {
    /// Stored (lowercase) form of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Conjuntos => "conjuntos",
            Self::Macaquinhos => "macaquinhos",
            Self::Tops => "tops",
            Self::Shorts => "shorts",
            Self::Other(value) => value,
        }
    }

    /// Title shown above a filtered product grid.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Conjuntos => "Conjuntos",
            Self::Macaquinhos => "Macaquinhos",
            Self::Tops => "Tops",
            Self::Shorts => "Shorts",
            Self::Other(_) => "Produtos",
        }
    }

    /// Parse a menu filter value. `"all"` and blank input mean no filter.
    #[must_use]
    pub fn parse_filter(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
            None
        } else {
            Some(Self::from(trimmed.to_owned()))
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "conjuntos" => Self::Conjuntos,
            "macaquinhos" => Self::Macaquinhos,
            "tops" => Self::Tops,
            "shorts" => Self::Shorts,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_owned()
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_parse_case_insensitively() {
        assert_eq!(Category::from("Tops".to_owned()), Category::Tops);
        assert_eq!(Category::from(" SHORTS ".to_owned()), Category::Shorts);
    }

    #[test]
    fn test_unknown_category_is_preserved() {
        let category = Category::from("Leggings".to_owned());
        assert_eq!(category, Category::Other("leggings".to_owned()));
        assert_eq!(category.as_str(), "leggings");
        assert_eq!(category.display_name(), "Produtos");
    }

    #[test]
    fn test_all_filter_means_no_category() {
        assert_eq!(Category::parse_filter("all"), None);
        assert_eq!(Category::parse_filter(""), None);
        assert_eq!(Category::parse_filter("tops"), Some(Category::Tops));
    }

    #[test]
    fn test_serde_uses_lowercase_string() {
        let json = serde_json::to_string(&Category::Macaquinhos).unwrap_or_default();
        assert_eq!(json, "\"macaquinhos\"");
        let parsed: Category = serde_json::from_str("\"conjuntos\"").unwrap_or(Category::Tops);
        assert_eq!(parsed, Category::Conjuntos);
    }
}
