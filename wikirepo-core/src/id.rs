//! Wikidata identifiers.
//!
//! Items (`Q…`) and properties (`P…`) share one numeric representation so that
//! identifiers are `Copy` and can be declared as constants.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Namespace of a Wikidata identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdKind {
    /// An item such as `Q183`.
    Item,
    /// A property such as `P1082`.
    Property,
}

impl IdKind {
    const fn prefix(self) -> char {
        match self {
            Self::Item => 'Q',
            Self::Property => 'P',
        }
    }
}

/// Identifier of a Wikidata item or property.
///
/// # Examples
///
/// ```
/// use wikirepo_core::EntityId;
///
/// let germany: EntityId = "Q183".parse()?;
/// assert_eq!(germany, EntityId::item(183));
/// assert_eq!(EntityId::property(1082).to_string(), "P1082");
/// # Ok::<(), wikirepo_core::IdError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct EntityId {
    kind: IdKind,
    number: u64,
}

impl EntityId {
    /// Build an item identifier (`Q{number}`).
    #[must_use]
    pub const fn item(number: u64) -> Self {
        Self {
            kind: IdKind::Item,
            number,
        }
    }

    /// Build a property identifier (`P{number}`).
    #[must_use]
    pub const fn property(number: u64) -> Self {
        Self {
            kind: IdKind::Property,
            number,
        }
    }

    /// Namespace of the identifier.
    #[must_use]
    pub const fn kind(self) -> IdKind {
        self.kind
    }

    /// Numeric part of the identifier.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.number
    }

    /// Whether the identifier names a property.
    #[must_use]
    pub const fn is_property(self) -> bool {
        matches!(self.kind, IdKind::Property)
    }
}

/// Error returned when text is not a Wikidata identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{raw}' is not a Wikidata identifier")]
pub struct IdError {
    /// The rejected input.
    pub raw: String,
}

impl FromStr for EntityId {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || IdError {
            raw: raw.to_owned(),
        };
        let mut chars = raw.chars();
        let kind = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('Q') => IdKind::Item,
            Some('P') => IdKind::Property,
            _ => return Err(invalid()),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number = digits.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { kind, number })
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.number)
    }
}

/// Report whether `raw` looks like a Wikidata identifier.
///
/// The prefix letter is matched case-insensitively.
///
/// ```
/// use wikirepo_core::is_wd_id;
///
/// assert!(is_wd_id("Q64"));
/// assert!(is_wd_id("p31"));
/// assert!(!is_wd_id("Berlin"));
/// ```
#[must_use]
pub fn is_wd_id(raw: &str) -> bool {
    raw.parse::<EntityId>().is_ok()
}

/// Point in time qualifier.
pub const POINT_IN_TIME: EntityId = EntityId::property(585);
/// Start time qualifier.
pub const START_TIME: EntityId = EntityId::property(580);
/// End time qualifier.
pub const END_TIME: EntityId = EntityId::property(582);
/// Contains the administrative territorial entity.
pub const CONTAINS_TERRITORY: EntityId = EntityId::property(150);
/// Links a location to its "economy of …" topic item.
pub const ECONOMY_OF_TOPIC: EntityId = EntityId::property(8744);
/// Links a location to its "geography of …" topic item.
pub const GEOGRAPHY_OF_TOPIC: EntityId = EntityId::property(2633);
