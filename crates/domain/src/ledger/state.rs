//! Product item lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle status of a product item.
///
/// State transitions:
/// ```text
/// Manufactured ──sell──► Sold ──return──► Returned ──recycle──► Recycled
/// ```
///
/// Transitions are strictly linear: no skips and no reversals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ProductStatus {
    /// Item has been produced by its manufacturer.
    #[default]
    Manufactured,

    /// Item has been sold.
    Sold,

    /// Item has been handed back for recycling.
    Returned,

    /// Item has been recycled (terminal state).
    Recycled,
}

impl ProductStatus {
    /// Returns true if an item in this status can be sold.
    pub fn can_sell(&self) -> bool {
        matches!(self, ProductStatus::Manufactured)
    }

    /// Returns true if an item in this status can be returned.
    pub fn can_return(&self) -> bool {
        matches!(self, ProductStatus::Sold)
    }

    /// Returns true if an item in this status can be recycled.
    pub fn can_recycle(&self) -> bool {
        matches!(self, ProductStatus::Returned)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProductStatus::Recycled)
    }

    /// Returns the status an item moves to next, if any.
    pub fn next(&self) -> Option<ProductStatus> {
        Transition::from_status(*self).map(Transition::target)
    }

    /// Returns the numeric status code (0 to 3).
    pub fn as_u8(&self) -> u8 {
        match self {
            ProductStatus::Manufactured => 0,
            ProductStatus::Sold => 1,
            ProductStatus::Returned => 2,
            ProductStatus::Recycled => 3,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Manufactured => "Manufactured",
            ProductStatus::Sold => "Sold",
            ProductStatus::Returned => "Returned",
            ProductStatus::Recycled => "Recycled",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a status code outside 0 to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown product status code: {0}")]
pub struct UnknownStatusCode(pub u8);

impl TryFrom<u8> for ProductStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ProductStatus::Manufactured),
            1 => Ok(ProductStatus::Sold),
            2 => Ok(ProductStatus::Returned),
            3 => Ok(ProductStatus::Recycled),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

impl From<ProductStatus> for u8 {
    fn from(status: ProductStatus) -> Self {
        status.as_u8()
    }
}

/// A lifecycle move applied to a batch of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Manufactured to Sold.
    Sell,
    /// Sold to Returned.
    Return,
    /// Returned to Recycled.
    Recycle,
}

impl Transition {
    /// Returns the transition that leaves `status`, if it is not terminal.
    pub fn from_status(status: ProductStatus) -> Option<Transition> {
        match status {
            ProductStatus::Manufactured => Some(Transition::Sell),
            ProductStatus::Sold => Some(Transition::Return),
            ProductStatus::Returned => Some(Transition::Recycle),
            ProductStatus::Recycled => None,
        }
    }

    /// Returns true if an item in `status` may take this transition.
    pub fn allows(&self, status: ProductStatus) -> bool {
        match self {
            Transition::Sell => status.can_sell(),
            Transition::Return => status.can_return(),
            Transition::Recycle => status.can_recycle(),
        }
    }

    /// The status items end up in.
    pub fn target(self) -> ProductStatus {
        match self {
            Transition::Sell => ProductStatus::Sold,
            Transition::Return => ProductStatus::Returned,
            Transition::Recycle => ProductStatus::Recycled,
        }
    }

    /// Verb form, as in "can sell".
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Sell => "sell",
            Transition::Return => "return",
            Transition::Recycle => "recycle",
        }
    }

    /// Participle form, as in "cannot be sold".
    pub fn past_participle(&self) -> &'static str {
        match self {
            Transition::Sell => "sold",
            Transition::Return => "returned",
            Transition::Recycle => "recycled",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
