use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ResolveError, TemplateError};

/// A filename ending tried after the zero-padded slot number.
///
/// `013a.png` is slot 13 with `Letter('a')`; `013.png` is slot 13 with `Bare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixVariant {
    /// No suffix: the canonical file for the slot
    Bare,
    /// A single lowercase letter appended to the number
    Letter(char),
}

impl SuffixVariant {
    /// Text inserted between the slot number and the extension.
    pub fn as_suffix(&self) -> String {
        match self {
            SuffixVariant::Bare => String::new(),
            SuffixVariant::Letter(c) => c.to_string(),
        }
    }
}

impl fmt::Display for SuffixVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuffixVariant::Bare => f.write_str("none"),
            SuffixVariant::Letter(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for SuffixVariant {
    type Err = TemplateError;

    /// Parse `""` or `"none"` as [`SuffixVariant::Bare`], a single lowercase
    /// ASCII letter as [`SuffixVariant::Letter`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(SuffixVariant::Bare);
        }

        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => Ok(SuffixVariant::Letter(c)),
            _ => Err(TemplateError::InvalidSuffix(s.to_string())),
        }
    }
}

/// Priority order in which suffix variants are tried for every slot.
///
/// Duplicates are dropped on construction; the first occurrence keeps its
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuffixOrder(Vec<SuffixVariant>);

impl SuffixOrder {
    /// Build an order from variants, rejecting an empty list.
    pub fn new(variants: impl IntoIterator<Item = SuffixVariant>) -> Result<Self, ResolveError> {
        let mut order: Vec<SuffixVariant> = Vec::new();
        for variant in variants {
            if !order.contains(&variant) {
                order.push(variant);
            }
        }

        if order.is_empty() {
            return Err(ResolveError::EmptySuffixOrder);
        }
        Ok(Self(order))
    }

    /// Only the canonical file per slot.
    pub fn bare() -> Self {
        Self(vec![SuffixVariant::Bare])
    }

    /// Parse a list of textual suffixes such as `["a", ""]`.
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self, TemplateError> {
        let variants = items
            .iter()
            .map(|item| item.as_ref().parse::<SuffixVariant>())
            .collect::<Result<Vec<_>, _>>()?;

        // An empty item list means "bare only", matching an empty CLI value
        Ok(Self::new(variants).unwrap_or_else(|_| Self::bare()))
    }

    pub fn variants(&self) -> &[SuffixVariant] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SuffixOrder {
    fn default() -> Self {
        Self::bare()
    }
}

impl fmt::Display for SuffixOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}
