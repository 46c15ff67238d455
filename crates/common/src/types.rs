use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identity of an external actor.
///
/// The ledger never verifies the token itself; authenticity is established
/// by whoever hands the token to the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManufacturerId(String);

impl ManufacturerId {
    /// Creates an identity from any string-like token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ManufacturerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ManufacturerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ManufacturerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ManufacturerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sequential product identifier, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Creates a product ID from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The id handed to the first product ever created.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the id that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ProductId> for u64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Error returned when a string is not a valid `"{product}-{sequence}"` id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid product item id: {0:?}")]
pub struct ParseProductItemIdError(pub String);

/// Identifier of a single product unit.
///
/// Rendered as `"{product_id}-{sequence}"`, where `sequence` is 1-based and
/// contiguous per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductItemId {
    product_id: ProductId,
    sequence: u64,
}

impl ProductItemId {
    pub fn new(product_id: ProductId, sequence: u64) -> Self {
        Self {
            product_id,
            sequence,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Display for ProductItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.product_id, self.sequence)
    }
}

impl FromStr for ProductItemId {
    type Err = ParseProductItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseProductItemIdError(s.to_string());

        let (product, sequence) = s.split_once('-').ok_or_else(invalid)?;
        let product = parse_part(product).ok_or_else(invalid)?;
        let sequence = parse_part(sequence).ok_or_else(invalid)?;

        Ok(Self::new(ProductId::new(product), sequence))
    }
}

/// Parses one 1-based part of an item id in its canonical spelling: ASCII
/// digits only, no sign, no leading zero.
fn parse_part(part: &str) -> Option<u64> {
    if part.is_empty() || part.starts_with('0') || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl TryFrom<String> for ProductItemId {
    type Error = ParseProductItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductItemId> for String {
    fn from(id: ProductItemId) -> Self {
        id.to_string()
    }
}
