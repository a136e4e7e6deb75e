//! Entities, claims and snaks as fetched from Wikidata.
//!
//! The model keeps only what time-indexed extraction needs: labels, claims in
//! document order, and qualifiers keyed by property.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{EntityId, parse_wikidata_time};

/// Payload of a snak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    /// Reference to another item or property.
    EntityRef(EntityId),
    /// Numeric quantity; `amount` keeps Wikidata's signed decimal text.
    Quantity {
        /// Signed decimal such as `+83019213`.
        amount: String,
        /// Unit entity URI, or `1` for dimensionless values.
        unit: String,
    },
    /// Plain string literal.
    Text(String),
    /// Time literal such as `+2019-00-00T00:00:00Z`.
    Time(String),
    /// Any other value kind (coordinates, monolingual text, …).
    Unsupported,
}

/// A property/value pair inside a claim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snak {
    /// `None` for `novalue`/`somevalue` snaks.
    pub value: Option<DataValue>,
}

impl Snak {
    /// Snak carrying `value`.
    #[must_use]
    pub const fn new(value: DataValue) -> Self {
        Self { value: Some(value) }
    }

    /// Snak without a value.
    #[must_use]
    pub const fn empty() -> Self {
        Self { value: None }
    }

    /// Referenced entity, if the snak points at one.
    #[must_use]
    pub const fn entity_ref(&self) -> Option<EntityId> {
        match self.value {
            Some(DataValue::EntityRef(id)) => Some(id),
            _ => None,
        }
    }

    /// Date of a time-valued snak.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match &self.value {
            Some(DataValue::Time(raw)) => parse_wikidata_time(raw),
            _ => None,
        }
    }
}

/// A statement about an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Claim {
    /// The main value.
    pub main: Snak,
    /// Qualifier snaks by property, in document order.
    pub qualifiers: BTreeMap<EntityId, Vec<Snak>>,
}

impl Claim {
    /// Claim with a main value and no qualifiers.
    #[must_use]
    pub const fn new(main: Snak) -> Self {
        Self {
            main,
            qualifiers: BTreeMap::new(),
        }
    }

    /// Append a qualifier snak.
    #[must_use]
    pub fn with_qualifier(mut self, property: EntityId, snak: Snak) -> Self {
        self.qualifiers.entry(property).or_default().push(snak);
        self
    }

    /// Whether any qualifier is present.
    #[must_use]
    pub fn has_qualifiers(&self) -> bool {
        !self.qualifiers.is_empty()
    }

    /// Whether a qualifier for `property` is present.
    #[must_use]
    pub fn has_qualifier(&self, property: EntityId) -> bool {
        self.qualifiers.contains_key(&property)
    }

    /// First qualifier snak for `property`.
    #[must_use]
    pub fn qualifier(&self, property: EntityId) -> Option<&Snak> {
        self.qualifiers.get(&property).and_then(|snaks| snaks.first())
    }

    /// Date of the first `property` qualifier; unparseable dates count as absent.
    #[must_use]
    pub fn qualifier_date(&self, property: EntityId) -> Option<NaiveDate> {
        self.qualifier(property).and_then(Snak::date)
    }
}

/// A Wikidata item or property.
///
/// # Examples
///
/// ```
/// use wikirepo_core::{Claim, DataValue, Entity, EntityId, Snak};
///
/// let population = EntityId::property(1082);
/// let germany = Entity::new(EntityId::item(183))
///     .with_label("en", "Germany")
///     .with_claim(
///         population,
///         Claim::new(Snak::new(DataValue::Quantity {
///             amount: "+83019213".into(),
///             unit: "1".into(),
///         })),
///     );
///
/// assert!(germany.has_property(population));
/// assert_eq!(germany.label(&["en".to_owned()]), Some("Germany"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Labels keyed by language code.
    pub labels: BTreeMap<String, String>,
    /// Claims keyed by property, in document order.
    pub claims: BTreeMap<EntityId, Vec<Claim>>,
}

impl Entity {
    /// Entity without labels or claims.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            labels: BTreeMap::new(),
            claims: BTreeMap::new(),
        }
    }

    /// Set the label for `language`.
    #[must_use]
    pub fn with_label(mut self, language: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(language.into(), label.into());
        self
    }

    /// Append a claim for `property`.
    #[must_use]
    pub fn with_claim(mut self, property: EntityId, claim: Claim) -> Self {
        self.claims.entry(property).or_default().push(claim);
        self
    }

    /// First label found in `languages`, in preference order.
    #[must_use]
    pub fn label(&self, languages: &[String]) -> Option<&str> {
        languages
            .iter()
            .find_map(|language| self.labels.get(language))
            .map(String::as_str)
    }

    /// Whether the entity carries at least one claim for `property`.
    #[must_use]
    pub fn has_property(&self, property: EntityId) -> bool {
        self.claims
            .get(&property)
            .is_some_and(|claims| !claims.is_empty())
    }

    /// Claims for `property`; empty when absent.
    #[must_use]
    pub fn claims(&self, property: EntityId) -> &[Claim] {
        self.claims.get(&property).map_or(&[], Vec::as_slice)
    }

    /// Claim `index` for `property`.
    #[must_use]
    pub fn claim(&self, property: EntityId, index: usize) -> Option<&Claim> {
        self.claims(property).get(index)
    }
}
