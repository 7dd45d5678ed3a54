use serde::{Deserialize, Serialize};

/// A canonical title after merge and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,
    /// Kept as opaque text; partial or unknown years survive untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<String>,
    /// Comma-delimited tag list as it appears in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    /// Text fed to the vectorizer. Empty when every source field is absent.
    #[serde(default)]
    pub text_content: String,
}

impl Entity {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            primary_name: None,
            original_name: None,
            alternate_name: None,
            release_year: None,
            categories: None,
            rating_mean: None,
            rating_count: None,
            text_content: String::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_primary_name(mut self, name: impl Into<String>) -> Self {
        self.primary_name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    #[inline]
    pub fn has_rating(&self) -> bool {
        self.rating_mean.is_some()
    }

    /// Name shown to users: primary name, then original, then the id.
    pub fn display_name(&self) -> &str {
        self.primary_name
            .as_deref()
            .or(self.original_name.as_deref())
            .unwrap_or(&self.id)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.release_year {
            Some(year) => write!(f, "{} ({})", self.display_name(), year),
            None => write!(f, "{}", self.display_name()),
        }
    }
}
