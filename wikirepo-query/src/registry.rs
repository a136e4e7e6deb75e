//! Declarative catalogue of the properties wikirepo knows how to query.
//!
//! Each record states which Wikidata property to read, how to extract its
//! value, where the value lands in the output table and what clean-up runs
//! afterwards. Adding a property means adding a record, not code.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use wikirepo_core::{ECONOMY_OF_TOPIC, EntityId, GEOGRAPHY_OF_TOPIC, Scalar};

use crate::SubProperty;

/// Errors raised by registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// No property of that name is registered.
    #[error("unknown property '{name}'")]
    UnknownProperty {
        /// Requested property name.
        name: String,
    },
    /// The property exists but belongs to another category.
    #[error("property '{name}' is not in the {category} category")]
    WrongCategory {
        /// Requested property name.
        name: String,
        /// Category it was requested under.
        category: Category,
    },
    /// No category of that name exists.
    #[error("unknown category '{name}'")]
    UnknownCategory {
        /// Requested category name.
        name: String,
    },
}

/// Thematic grouping of properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Population and people.
    Demographic,
    /// Economic indicators.
    Economic,
    /// Physical and political geography.
    Geographic,
    /// Institutions and memberships.
    Institutional,
    /// Government and leadership.
    Political,
    /// Identifiers and codes.
    Misc,
}

impl Category {
    /// Every category, in query order.
    pub const ALL: [Self; 6] = [
        Self::Demographic,
        Self::Economic,
        Self::Geographic,
        Self::Institutional,
        Self::Political,
        Self::Misc,
    ];

    /// Lowercase category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Demographic => "demographic",
            Self::Economic => "economic",
            Self::Geographic => "geographic",
            Self::Institutional => "institutional",
            Self::Political => "political",
            Self::Misc => "misc",
        }
    }

    /// Property linking a location to the topic item that carries this
    /// category's statements, if the category has one.
    #[must_use]
    pub const fn topic_property(self) -> Option<EntityId> {
        match self {
            Self::Economic => Some(ECONOMY_OF_TOPIC),
            Self::Geographic => Some(GEOGRAPHY_OF_TOPIC),
            Self::Demographic | Self::Institutional | Self::Political | Self::Misc => None,
        }
    }
}

impl FromStr for Category {
    type Err = RegistryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == raw)
            .ok_or_else(|| RegistryError::UnknownCategory {
                name: raw.to_owned(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where extracted values land in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One column holding one value per row.
    Column(&'static str),
    /// One column per distinct main value, named `{prefix}_{label}`.
    Prefixed(&'static str),
}

/// Clean-up applied to a property's table after assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Leave the table as assembled.
    None,
    /// Replace exact text values in the output column.
    ReplaceValues(&'static [(&'static str, &'static str)]),
    /// Rename generated columns, then mark missing cells in prefixed columns
    /// as `false`.
    RenameAndFillFalse(&'static [(&'static str, &'static str)]),
}

/// A queryable property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    /// Registry key.
    pub name: &'static str,
    /// Category the property is queried under.
    pub category: Category,
    /// Wikidata property read from each location.
    pub property: EntityId,
    /// Part of the claim that supplies the value.
    pub sub: SubProperty,
    /// Output column layout.
    pub output: Output,
    /// Text removed from values before coercion.
    pub ignore: &'static str,
    /// Whether claims hold over start/end spans instead of a point in time.
    pub span: bool,
    /// Clean-up after assignment.
    pub post: PostProcess,
}

impl PropertySpec {
    const fn column(
        name: &'static str,
        category: Category,
        property: u64,
        column: &'static str,
    ) -> Self {
        Self {
            name,
            category,
            property: EntityId::property(property),
            sub: SubProperty::Main,
            output: Output::Column(column),
            ignore: "",
            span: false,
            post: PostProcess::None,
        }
    }

    const fn spanning(mut self) -> Self {
        self.span = true;
        self
    }

    const fn ignoring(mut self, ignore: &'static str) -> Self {
        self.ignore = ignore;
        self
    }

    /// Whether only the existence of a claim is recorded.
    #[must_use]
    pub const fn is_presence(&self) -> bool {
        matches!(self.sub, SubProperty::Presence)
    }
}

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("Kingdom of the Netherlands", "Netherlands"),
    ("Kingdom of Denmark", "Denmark"),
    ("Danish Realm", "Denmark"),
];

const MEMBERSHIP_COLUMNS: &[(&str, &str)] = &[
    ("mem_world_trade_organization", "mem_wto"),
    ("mem_european_union", "mem_eu"),
    (
        "mem_organisation_for_economic_cooperation_and_development",
        "mem_oecd",
    ),
    ("mem_united_nations", "mem_un"),
    ("mem_world_health_organization", "mem_who"),
    ("mem_international_monetary_fund", "mem_imf"),
];

/// The set of queryable properties.
///
/// # Examples
///
/// ```
/// use wikirepo_query::{Category, PropertyRegistry};
///
/// let registry = PropertyRegistry::standard();
/// let population = registry.get("population")?;
/// assert_eq!(population.property.to_string(), "P1082");
/// assert!(registry.names_in(Category::Demographic).contains(&"population"));
/// # Ok::<(), wikirepo_query::RegistryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    specs: Vec<PropertySpec>,
}

impl PropertyRegistry {
    /// Registry with the built-in properties.
    #[must_use]
    pub fn standard() -> Self {
        use Category::{Demographic, Economic, Geographic, Institutional, Misc, Political};

        let specs = vec![
            PropertySpec {
                sub: SubProperty::Qualifier(EntityId::property(1107)),
                output: Output::Prefixed("eth"),
                ..PropertySpec::column("ethnic_div", Demographic, 172, "")
            },
            PropertySpec::column("life_expectancy", Demographic, 2250, "life_exp"),
            PropertySpec::column("literacy", Demographic, 6897, "literacy_rate")
                .ignoring(" percent"),
            PropertySpec::column("population", Demographic, 1082, "population"),
            PropertySpec::column("gdp_ppp", Economic, 4010, "gdp_ppp"),
            PropertySpec::column("inflation_rate", Economic, 1279, "inflation"),
            PropertySpec::column("nom_gdp", Economic, 2131, "nom_gdp"),
            PropertySpec::column("unemployment", Economic, 1198, "unemployment"),
            PropertySpec::column("area", Geographic, 2046, "area_km2"),
            PropertySpec::column("continent", Geographic, 30, "continent").spanning(),
            PropertySpec {
                post: PostProcess::ReplaceValues(COUNTRY_NAMES),
                ..PropertySpec::column("country", Geographic, 17, "country").spanning()
            },
            PropertySpec::column("capital", Institutional, 36, "capital").spanning(),
            PropertySpec::column("fh_category", Institutional, 1552, "fh_category")
                .ignoring(" country"),
            PropertySpec::column("human_dev_idx", Institutional, 1081, "human_dev_idx"),
            PropertySpec {
                sub: SubProperty::Presence,
                output: Output::Prefixed("mem"),
                post: PostProcess::RenameAndFillFalse(MEMBERSHIP_COLUMNS),
                ..PropertySpec::column("org_membership", Institutional, 463, "").spanning()
            },
            PropertySpec::column("executive", Political, 6, "executive").spanning(),
            PropertySpec::column("country_abbr", Misc, 297, "abbr"),
            PropertySpec::column("sub_country_abbr", Misc, 300, "sub_abbr"),
        ];
        Self { specs }
    }

    /// Registry holding exactly `specs`.
    #[must_use]
    pub const fn from_specs(specs: Vec<PropertySpec>) -> Self {
        Self { specs }
    }

    /// Look up a property by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProperty`] for unregistered names.
    pub fn get(&self, name: &str) -> Result<&PropertySpec, RegistryError> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| RegistryError::UnknownProperty {
                name: name.to_owned(),
            })
    }

    /// Look up a property requested under `category`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProperty`] for unregistered names and
    /// [`RegistryError::WrongCategory`] for properties of another category.
    pub fn get_in(&self, category: Category, name: &str) -> Result<&PropertySpec, RegistryError> {
        let spec = self.get(name)?;
        if spec.category == category {
            Ok(spec)
        } else {
            Err(RegistryError::WrongCategory {
                name: name.to_owned(),
                category,
            })
        }
    }

    /// Names of the properties in `category`, in registration order.
    #[must_use]
    pub fn names_in(&self, category: Category) -> Vec<&'static str> {
        self.in_category(category).map(|spec| spec.name).collect()
    }

    /// Properties in `category`, in registration order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &PropertySpec> {
        self.specs
            .iter()
            .filter(move |spec| spec.category == category)
    }

    /// Every registered property.
    pub fn iter(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.iter()
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Value written into membership columns for locations without the claim.
pub(crate) const ABSENT_MEMBERSHIP: Scalar = Scalar::Bool(false);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> PropertyRegistry {
        PropertyRegistry::standard()
    }

    #[rstest]
    #[case("population", 1082, Output::Column("population"), false)]
    #[case("country", 17, Output::Column("country"), true)]
    #[case("org_membership", 463, Output::Prefixed("mem"), true)]
    #[case("ethnic_div", 172, Output::Prefixed("eth"), false)]
    #[case("sub_country_abbr", 300, Output::Column("sub_abbr"), false)]
    fn records_describe_their_property(
        registry: PropertyRegistry,
        #[case] name: &str,
        #[case] pid: u64,
        #[case] output: Output,
        #[case] span: bool,
    ) {
        let spec = registry.get(name).expect("registered property");
        assert_eq!(spec.property, EntityId::property(pid));
        assert_eq!(spec.output, output);
        assert_eq!(spec.span, span);
    }

    #[rstest]
    fn unknown_names_are_errors(registry: PropertyRegistry) {
        assert_eq!(
            registry.get("gdp"),
            Err(RegistryError::UnknownProperty { name: "gdp".into() })
        );
    }

    #[rstest]
    fn lookups_respect_categories(registry: PropertyRegistry) {
        assert!(registry.get_in(Category::Misc, "sub_country_abbr").is_ok());
        assert_eq!(
            registry.get_in(Category::Economic, "population"),
            Err(RegistryError::WrongCategory {
                name: "population".into(),
                category: Category::Economic,
            })
        );
    }

    #[rstest]
    fn every_category_has_properties(registry: PropertyRegistry) {
        for category in Category::ALL {
            assert!(
                !registry.names_in(category).is_empty(),
                "{category} should list properties"
            );
        }
    }

    #[rstest]
    #[case(Category::Economic, Some(ECONOMY_OF_TOPIC))]
    #[case(Category::Geographic, Some(GEOGRAPHY_OF_TOPIC))]
    #[case(Category::Demographic, None)]
    fn topic_properties_follow_category(
        #[case] category: Category,
        #[case] expected: Option<EntityId>,
    ) {
        assert_eq!(category.topic_property(), expected);
    }

    #[rstest]
    fn categories_parse_by_name() {
        assert_eq!("economic".parse::<Category>(), Ok(Category::Economic));
        assert!("weather".parse::<Category>().is_err());
    }
}
