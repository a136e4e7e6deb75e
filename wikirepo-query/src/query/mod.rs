//! Query orchestration.
//!
//! A [`QuerySession`] binds an entity cache, the locations to report on and
//! the time mode. Each property becomes its own table; properties of a
//! category and then the categories themselves are inner-joined on the
//! location and time columns.

mod request;

pub use request::{PropertySelection, QueryRequest};

use chrono::{Local, NaiveDate};
use log::info;
use wikirepo_core::{EntityCache, EntityId, Interval, TimeQuery};

use crate::{
    Category, PropertyRegistry, PropertySpec, QueryError, RegistryError,
    location::{Locations, expand_locations},
    registry::{ABSENT_MEMBERSHIP, Output, PostProcess},
    table::{
        AssignMode, Assignment, Table, TableError, assign_column, assign_prefixed_columns, base_table,
        cleanup, id_column, location_column,
    },
    timeline::{build_qualified_timelines, build_value_timelines},
};

/// Cache, locations and time mode shared by every property of a query.
#[derive(Debug)]
pub struct QuerySession<'c> {
    cache: &'c mut EntityCache,
    locations: Locations,
    depth: usize,
    time: TimeQuery,
}

impl<'c> QuerySession<'c> {
    /// Bind `cache` to the locations and time mode of a query.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::FlatDepth`] when a flat location list is paired
    /// with a non-zero depth.
    pub fn new(
        cache: &'c mut EntityCache,
        locations: Locations,
        depth: usize,
        time: TimeQuery,
    ) -> Result<Self, QueryError> {
        if matches!(locations, Locations::Flat(_)) && depth != 0 {
            return Err(QueryError::FlatDepth { depth });
        }
        Ok(Self {
            cache,
            locations,
            depth,
            time,
        })
    }

    /// Locations rows are laid out for.
    #[must_use]
    pub const fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Depth whose locations values are read for.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Time mode of the query.
    #[must_use]
    pub const fn time(&self) -> &TimeQuery {
        &self.time
    }

    /// Columns tables of this session are joined on.
    #[must_use]
    pub fn join_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = (0..=self.depth).map(location_column).collect();
        if let Some(interval) = self.time.interval() {
            columns.push(interval.column_name().to_owned());
        }
        columns
    }

    fn ids(&self) -> Vec<EntityId> {
        match &self.locations {
            Locations::Flat(ids) => ids.clone(),
            Locations::Tree(tree) => tree.ids_at_depth(self.depth),
        }
    }

    /// Table of the locations and time buckets with no property columns.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Join`] when the skeleton cannot be laid out.
    pub fn skeleton(&mut self) -> Result<Table, QueryError> {
        let mut table = base_table(self.cache, &self.locations, self.depth, &self.time, None)
            .map_err(|source| QueryError::Join { source })?;
        cleanup(&mut table, &id_column(self.depth))
            .map_err(|source| QueryError::Join { source })?;
        Ok(table)
    }

    /// Query one property into its own table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] when reading entities fails and
    /// [`QueryError::Table`] when assembly fails; both name the property.
    pub fn query_property(&mut self, spec: &PropertySpec) -> Result<Table, QueryError> {
        let property = spec.name;
        let store_error = |source| QueryError::Store { property, source };
        let table_error = |source| QueryError::Table { property, source };

        let ids = self.ids();
        info!("Querying {property} ({}) for {} locations", spec.property, ids.len());

        let id_name = id_column(self.depth);
        let target = Assignment {
            id_column: &id_name,
            time_column: self.time.interval().map(Interval::column_name),
            mode: AssignMode::for_query(&self.time),
        };

        let mut table = match spec.output {
            Output::Column(column) => {
                let timelines = build_value_timelines(self.cache, &ids, spec, &self.time)
                    .map_err(store_error)?;
                let mut assembled =
                    base_table(self.cache, &self.locations, self.depth, &self.time, Some(column))
                        .map_err(table_error)?;
                assign_column(&mut assembled, &target, column, &timelines, spec.span)
                    .map_err(table_error)?;
                assembled
            }
            Output::Prefixed(prefix) => {
                let timelines = build_qualified_timelines(self.cache, &ids, spec, &self.time)
                    .map_err(store_error)?;
                let mut assembled =
                    base_table(self.cache, &self.locations, self.depth, &self.time, None)
                        .map_err(table_error)?;
                let omit_date = spec.span && spec.is_presence();
                assign_prefixed_columns(&mut assembled, &target, prefix, &timelines, omit_date)
                    .map_err(table_error)?;
                assembled
            }
        };

        cleanup(&mut table, &id_name).map_err(table_error)?;
        post_process(&mut table, spec).map_err(table_error)?;
        Ok(table)
    }

    /// Query the selected properties of `category` and join them.
    ///
    /// Returns `None` when the selection names no properties.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Registry`] for unknown or misplaced names and
    /// propagates property and join failures.
    pub fn query_category(
        &mut self,
        registry: &PropertyRegistry,
        category: Category,
        selection: &PropertySelection,
    ) -> Result<Option<Table>, QueryError> {
        let specs = selected_specs(registry, category, selection)?;
        if specs.is_empty() {
            return Ok(None);
        }
        info!("Querying {category} properties");
        let mut joined: Option<Table> = None;
        for spec in specs {
            let table = self.query_property(spec)?;
            joined = Some(self.join(joined, table)?);
        }
        Ok(joined)
    }

    fn join(&self, left: Option<Table>, right: Table) -> Result<Table, QueryError> {
        let Some(existing) = left else {
            return Ok(right);
        };
        let keys = self.join_columns();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        existing
            .inner_join(&right, &key_refs)
            .map_err(|source| QueryError::Join { source })
    }
}

/// Properties named by `selection`, in registry order for `Every(true)` and
/// request order otherwise.
fn selected_specs<'r>(
    registry: &'r PropertyRegistry,
    category: Category,
    selection: &PropertySelection,
) -> Result<Vec<&'r PropertySpec>, RegistryError> {
    match selection {
        PropertySelection::Every(false) => Ok(Vec::new()),
        PropertySelection::Every(true) => Ok(registry.in_category(category).collect()),
        PropertySelection::Named(names) => names
            .iter()
            .map(|name| registry.get_in(category, name))
            .collect(),
    }
}

fn post_process(table: &mut Table, spec: &PropertySpec) -> Result<(), TableError> {
    match (spec.post, spec.output) {
        (PostProcess::ReplaceValues(replacements), Output::Column(column)) => {
            table.replace_values(column, replacements)
        }
        (PostProcess::RenameAndFillFalse(renames), output) => {
            for &(from, to) in renames {
                if table.has_column(from) {
                    table.rename_column(from, to)?;
                }
            }
            if let Output::Prefixed(prefix) = output {
                let marker = format!("{prefix}_");
                let generated: Vec<String> = table
                    .columns()
                    .iter()
                    .filter(|name| name.starts_with(&marker))
                    .cloned()
                    .collect();
                for name in generated {
                    table.fill_missing(&name, &ABSENT_MEMBERSHIP)?;
                }
            }
            Ok(())
        }
        (PostProcess::None | PostProcess::ReplaceValues(_), _) => Ok(()),
    }
}

/// Run `request` against `cache` with the standard registry, treating the
/// local date as today.
///
/// # Errors
///
/// See [`query_at`].
pub fn query(request: &QueryRequest, cache: &mut EntityCache) -> Result<Table, QueryError> {
    query_at(
        request,
        cache,
        &PropertyRegistry::standard(),
        Local::now().date_naive(),
    )
}

/// Run `request` against `cache` with an explicit registry and reference
/// date.
///
/// Every property name is validated before any entity is fetched. With no
/// properties selected the result is the location and time skeleton.
///
/// # Errors
///
/// Returns [`QueryError::Time`] for an unknown interval or a timespan
/// without an interval, [`QueryError::Registry`] for unknown properties,
/// [`QueryError::Expansion`] when sub-locations cannot be read, and
/// propagates property failures.
pub fn query_at(
    request: &QueryRequest,
    cache: &mut EntityCache,
    registry: &PropertyRegistry,
    today: NaiveDate,
) -> Result<Table, QueryError> {
    let time = TimeQuery::new(request.interval()?, request.timespan, today)?;

    let mut selected = Vec::new();
    for category in Category::ALL {
        let Some(selection) = request.properties.get(&category) else {
            continue;
        };
        selected_specs(registry, category, selection)?;
        selected.push((category, selection));
    }

    let locations = if request.depth == 0 {
        Locations::Flat(request.locations.clone())
    } else {
        info!(
            "Expanding {} locations to depth {}",
            request.locations.len(),
            request.depth
        );
        let tree = expand_locations(
            cache,
            &request.locations,
            request.depth,
            &request.filter(),
            &time,
        )
        .map_err(|source| QueryError::Expansion { source })?;
        Locations::Tree(tree)
    };

    let mut session = QuerySession::new(cache, locations, request.depth, time)?;
    let mut result: Option<Table> = None;
    for (category, selection) in selected {
        if let Some(table) = session.query_category(registry, category, selection)? {
            result = Some(session.join(result, table)?);
        }
    }
    result.map_or_else(|| session.skeleton(), Ok)
}

#[cfg(test)]
mod tests;
