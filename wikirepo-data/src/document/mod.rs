//! Decoding of `Special:EntityData` JSON documents.
//!
//! Only labels and claims are read. Snak values map onto
//! [`DataValue`]; value kinds the query engine never interprets become
//! [`DataValue::Unsupported`], and `novalue`/`somevalue` snaks carry no value.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use thiserror::Error;
use wikirepo_core::{Claim, DataValue, Entity, EntityId, Snak, StoreError};

/// Errors raised while decoding an entity document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// The bytes are not a well-formed entity document.
    #[error("failed to parse entity document: {source}")]
    Parse {
        /// Decoder failure.
        #[source]
        source: simd_json::Error,
    },
    /// The document does not contain the requested entity.
    #[error("entity document does not contain {id}")]
    MissingEntity {
        /// Requested entity.
        id: EntityId,
    },
    /// An entity key in the document is not a Wikidata identifier.
    #[error("entity document names an invalid identifier '{raw}'")]
    InvalidId {
        /// Offending identifier text.
        raw: String,
    },
}

impl DocumentError {
    /// Report the failure as a [`StoreError::Malformed`] for `id`.
    #[must_use]
    pub fn into_store_error(self, id: EntityId) -> StoreError {
        StoreError::Malformed {
            id,
            message: self.to_string(),
        }
    }
}

/// Decode the entity `id` from a `Special:EntityData` document.
///
/// The decoder works in place, so `bytes` is clobbered. When the document
/// holds a single entity under another identifier (a redirect), that entity
/// is returned.
///
/// # Examples
///
/// ```
/// use wikirepo_core::EntityId;
/// use wikirepo_data::parse_entity_document;
///
/// let mut bytes = br#"{"entities":{"Q183":{"id":"Q183",
///     "labels":{"en":{"language":"en","value":"Germany"}},
///     "claims":{"P297":[{"mainsnak":{"snaktype":"value",
///         "datavalue":{"type":"string","value":"DE"}}}]}}}}"#
///     .to_vec();
/// let germany = parse_entity_document(EntityId::item(183), &mut bytes)?;
///
/// assert_eq!(germany.labels.get("en").map(String::as_str), Some("Germany"));
/// assert!(germany.has_property(EntityId::property(297)));
/// # Ok::<(), wikirepo_data::DocumentError>(())
/// ```
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] for undecodable bytes,
/// [`DocumentError::MissingEntity`] when the entity is absent and
/// [`DocumentError::InvalidId`] when the entity's own identifier is invalid.
pub fn parse_entity_document(id: EntityId, bytes: &mut [u8]) -> Result<Entity, DocumentError> {
    let mut document: RawDocument =
        simd_json::serde::from_slice(bytes).map_err(|source| DocumentError::Parse { source })?;
    let key = id.to_string();
    let raw = match document.entities.remove(&key) {
        Some(found) => found,
        None if document.entities.len() == 1 => {
            let (target, found) = document
                .entities
                .pop_first()
                .ok_or(DocumentError::MissingEntity { id })?;
            debug!("{id} redirects to {target}");
            found
        }
        None => return Err(DocumentError::MissingEntity { id }),
    };
    raw.into_entity()
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    entities: BTreeMap<String, RawEntity>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    id: String,
    #[serde(default)]
    labels: BTreeMap<String, RawLabel>,
    #[serde(default)]
    claims: BTreeMap<String, Vec<RawClaim>>,
}

impl RawEntity {
    fn into_entity(self) -> Result<Entity, DocumentError> {
        let id = self
            .id
            .parse::<EntityId>()
            .map_err(|_| DocumentError::InvalidId { raw: self.id.clone() })?;
        let mut entity = Entity::new(id);
        for (language, label) in self.labels {
            entity.labels.insert(language, label.value);
        }
        for (property, claims) in self.claims {
            let Some(pid) = parse_property(&property) else {
                continue;
            };
            let converted: Vec<Claim> = claims.into_iter().map(RawClaim::into_claim).collect();
            entity.claims.insert(pid, converted);
        }
        Ok(entity)
    }
}

fn parse_property(raw: &str) -> Option<EntityId> {
    let parsed = raw.parse::<EntityId>().ok();
    if parsed.is_none() {
        debug!("skipping claims under invalid property key '{raw}'");
    }
    parsed
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawClaim {
    #[serde(rename = "mainsnak")]
    main_snak: RawSnak,
    #[serde(default)]
    qualifiers: BTreeMap<String, Vec<RawSnak>>,
}

impl RawClaim {
    fn into_claim(self) -> Claim {
        let mut claim = Claim::new(self.main_snak.into_snak());
        for (property, snaks) in self.qualifiers {
            let Some(pid) = parse_property(&property) else {
                continue;
            };
            claim
                .qualifiers
                .insert(pid, snaks.into_iter().map(RawSnak::into_snak).collect());
        }
        claim
    }
}

#[derive(Debug, Deserialize)]
struct RawSnak {
    #[serde(rename = "snaktype")]
    snak_type: RawSnakType,
    #[serde(rename = "datavalue")]
    data_value: Option<RawDataValue>,
}

impl RawSnak {
    fn into_snak(self) -> Snak {
        if self.snak_type != RawSnakType::Value {
            return Snak::empty();
        }
        self.data_value
            .map_or_else(Snak::empty, |value| Snak::new(value.into_data_value()))
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum RawSnakType {
    Value,
    Somevalue,
    Novalue,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawDataValue {
    #[serde(rename = "wikibase-entityid")]
    Entity { value: RawEntityId },
    #[serde(rename = "quantity")]
    Quantity { value: RawQuantity },
    #[serde(rename = "string")]
    Text { value: String },
    #[serde(rename = "time")]
    Time { value: RawTime },
    #[serde(other)]
    Unsupported,
}

impl RawDataValue {
    fn into_data_value(self) -> DataValue {
        match self {
            Self::Entity { value } => value
                .entity_id()
                .map_or(DataValue::Unsupported, DataValue::EntityRef),
            Self::Quantity { value } => DataValue::Quantity {
                amount: value.amount,
                unit: value.unit,
            },
            Self::Text { value } => DataValue::Text(value),
            Self::Time { value } => DataValue::Time(value.time),
            Self::Unsupported => DataValue::Unsupported,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntityId {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "entity-type", default)]
    entity_type: Option<String>,
    #[serde(rename = "numeric-id", default)]
    numeric_id: Option<u64>,
}

impl RawEntityId {
    fn entity_id(&self) -> Option<EntityId> {
        if let Some(raw) = &self.id {
            return raw.parse().ok();
        }
        match (self.entity_type.as_deref(), self.numeric_id) {
            (Some("item"), Some(number)) => Some(EntityId::item(number)),
            (Some("property"), Some(number)) => Some(EntityId::property(number)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuantity {
    amount: String,
    #[serde(default)]
    unit: String,
}

#[derive(Debug, Deserialize)]
struct RawTime {
    time: String,
}
