use serde::{Deserialize, Serialize};
use crate::{Entity, Error, Result};

/// How rating rows attach to the filtered primary rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingJoin {
    /// Unrated titles are kept with rating fields absent.
    #[default]
    Left,
    /// Unrated titles are dropped.
    Inner,
}

impl std::str::FromStr for RatingJoin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(RatingJoin::Left),
            "inner" => Ok(RatingJoin::Inner),
            other => Err(Error::InvalidConfig(format!("unknown rating join: {}", other))),
        }
    }
}

/// Entity fields that can feed the vectorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    PrimaryName,
    OriginalName,
    AlternateName,
    Categories,
}

impl TextField {
    fn value<'a>(&self, entity: &'a Entity) -> Option<&'a str> {
        match self {
            TextField::PrimaryName => entity.primary_name.as_deref(),
            TextField::OriginalName => entity.original_name.as_deref(),
            TextField::AlternateName => entity.alternate_name.as_deref(),
            TextField::Categories => entity.categories.as_deref(),
        }
    }
}

impl std::str::FromStr for TextField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "primary_name" | "primary" => Ok(TextField::PrimaryName),
            "original_name" | "original" => Ok(TextField::OriginalName),
            "alternate_name" | "alternate" => Ok(TextField::AlternateName),
            "categories" | "genres" => Ok(TextField::Categories),
            other => Err(Error::InvalidConfig(format!("unknown text field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default)]
    pub rating_join: RatingJoin,
    /// Classification a primary row must carry to be kept.
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
}

fn default_entity_type() -> String {
    "movie".to_string()
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            rating_join: RatingJoin::Left,
            entity_type: default_entity_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default = "default_text_fields")]
    pub fields: Vec<TextField>,
}

fn default_text_fields() -> Vec<TextField> {
    vec![TextField::PrimaryName, TextField::Categories]
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { fields: default_text_fields() }
    }
}

impl TextConfig {
    /// Join the configured fields that are present, in configured order.
    pub fn compose(&self, entity: &Entity) -> String {
        self.fields
            .iter()
            .filter_map(|field| field.value(entity))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Settings for one load cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub text: TextConfig,
}
