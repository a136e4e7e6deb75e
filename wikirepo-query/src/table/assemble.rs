//! Skeleton construction and timeline assignment.

use log::debug;
use wikirepo_core::{EntityCache, MISSING_TEXT, Scalar, TimeKey, TimeQuery};

use super::{QID_COLUMN, Table, TableError, id_cell, id_column, location_column, prefixed_column};
use crate::location::{LocationTree, Locations, NodeId};
use crate::timeline::{Qualified, Timeline, TimelineSet};

/// How timeline values are matched to rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    /// Every bucket is written to the row with the same identifier and time.
    All,
    /// Only the latest bucket is written, annotated with its date.
    MostRecent,
}

impl AssignMode {
    /// Mode matching the shape of `time`.
    #[must_use]
    pub const fn for_query(time: &TimeQuery) -> Self {
        if time.is_most_recent() {
            Self::MostRecent
        } else {
            Self::All
        }
    }
}

/// Where in a skeleton values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Column holding the identifier each row is matched on.
    pub id_column: &'a str,
    /// Column holding the time bucket, absent in most-recent tables.
    pub time_column: Option<&'a str>,
    /// Matching strategy.
    pub mode: AssignMode,
}

enum Buckets {
    Window,
    Listed(Vec<TimeKey>),
    Untimed,
}

struct RowPath {
    labels: Vec<Scalar>,
    id: Scalar,
    buckets: Buckets,
}

/// Lay out one row per location and time bucket.
///
/// Columns are the location labels for depths `0..=depth`, the identifier
/// column of `depth`, the time column when `time` is windowed, and
/// `value_column` when given. Tree leaves use their own valid buckets and
/// fall back to the whole window when they have none.
///
/// # Errors
///
/// Returns [`TableError::FlatDepth`] for a flat list with `depth > 0`,
/// [`TableError::DepthMismatch`] when a tree has a different depth, and
/// propagates label lookups.
pub fn base_table(
    cache: &mut EntityCache,
    locations: &Locations,
    depth: usize,
    time: &TimeQuery,
    value_column: Option<&str>,
) -> Result<Table, TableError> {
    let paths = match locations {
        Locations::Flat(ids) => {
            if depth != 0 {
                return Err(TableError::FlatDepth { depth });
            }
            let mut paths = Vec::with_capacity(ids.len());
            for &id in ids {
                let label = cache.label(id)?.unwrap_or_else(|| id.to_string());
                paths.push(RowPath {
                    labels: vec![Scalar::Text(label)],
                    id: id_cell(id),
                    buckets: Buckets::Window,
                });
            }
            paths
        }
        Locations::Tree(tree) => {
            let derived = tree.derive_depth();
            if derived != depth {
                return Err(TableError::DepthMismatch {
                    given: depth,
                    derived,
                });
            }
            let mut paths = Vec::new();
            let mut labels = Vec::with_capacity(depth.saturating_add(1));
            for &root in tree.roots() {
                collect_paths(tree, root, depth, &mut labels, &mut paths);
            }
            paths
        }
    };

    let mut columns: Vec<String> = (0..=depth).map(location_column).collect();
    columns.push(id_column(depth));
    let window = time.axis().map(|axis| {
        columns.push(axis.interval().column_name().to_owned());
        axis.buckets()
    });
    if let Some(name) = value_column {
        columns.push(name.to_owned());
    }

    let mut table = Table::new(columns);
    let value_cell = value_column.map(|_| Scalar::Missing);
    for path in paths {
        let mut prefix = path.labels;
        prefix.push(path.id);
        let Some(window_buckets) = &window else {
            prefix.extend(value_cell.clone());
            table.push_row(prefix)?;
            continue;
        };
        let times: Vec<Scalar> = match path.buckets {
            Buckets::Window => window_buckets.iter().cloned().map(Scalar::Text).collect(),
            Buckets::Listed(keys) if !keys.is_empty() => keys
                .iter()
                .map(|key| Scalar::Text(key.to_string()))
                .collect(),
            Buckets::Listed(_) | Buckets::Untimed => vec![Scalar::Missing],
        };
        for bucket in times {
            let mut row = prefix.clone();
            row.push(bucket);
            row.extend(value_cell.clone());
            table.push_row(row)?;
        }
    }
    Ok(table)
}

fn collect_paths(
    tree: &LocationTree,
    node: NodeId,
    depth: usize,
    labels: &mut Vec<Scalar>,
    paths: &mut Vec<RowPath>,
) {
    let Some(entry) = tree.node(node) else {
        return;
    };
    labels.push(Scalar::Text(entry.label.clone()));
    let children = entry.children().unwrap_or(&[]);
    if entry.depth >= depth {
        paths.push(RowPath {
            labels: labels.clone(),
            id: id_cell(entry.id),
            buckets: entry
                .valid_buckets
                .clone()
                .map_or(Buckets::Window, Buckets::Listed),
        });
    } else if children.is_empty() {
        let mut padded = labels.clone();
        padded.resize(depth.saturating_add(1), Scalar::Missing);
        paths.push(RowPath {
            labels: padded,
            id: Scalar::Missing,
            buckets: Buckets::Untimed,
        });
    } else {
        for &child in children {
            collect_paths(tree, child, depth, labels, paths);
        }
    }
    labels.pop();
}

/// Write single-value timelines into `column`.
///
/// In [`AssignMode::MostRecent`] every row of an entity receives the latest
/// value, suffixed with ` (date)` unless `span` is set or the value is
/// missing.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when a named column is absent.
pub fn assign_column(
    table: &mut Table,
    target: &Assignment<'_>,
    column: &str,
    timelines: &TimelineSet<Scalar>,
    span: bool,
) -> Result<(), TableError> {
    let value_index = table.column_index(column)?;
    let id_index = table.column_index(target.id_column)?;
    let time_index = target
        .time_column
        .map(|name| table.column_index(name))
        .transpose()?;

    for (id, timeline) in timelines.iter() {
        let id_value = id_cell(id);
        match target.mode {
            AssignMode::All => {
                for (key, value) in timeline {
                    match matching_row(table, id_index, &id_value, time_index, key) {
                        Some(row) => table.set(row, value_index, value.clone()),
                        None => debug!("no row for {id} at {key}; dropping {column} value"),
                    }
                }
            }
            AssignMode::MostRecent => {
                let Some((key, value)) = most_recent(timeline) else {
                    continue;
                };
                let cell = dated(value, key, span);
                for row in table.rows_where(id_index, &id_value) {
                    table.set(row, value_index, cell.clone());
                }
            }
        }
    }
    Ok(())
}

/// Write qualified timelines into one column per label, named
/// `{prefix}_{label}`.
///
/// Columns are created on first use, in encounter order. In
/// [`AssignMode::MostRecent`] only the entity's first row is written and
/// values carry a ` (date)` suffix unless `omit_date` is set.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when a named column is absent.
pub fn assign_prefixed_columns(
    table: &mut Table,
    target: &Assignment<'_>,
    prefix: &str,
    timelines: &TimelineSet<Qualified>,
    omit_date: bool,
) -> Result<(), TableError> {
    let id_index = table.column_index(target.id_column)?;
    let time_index = target
        .time_column
        .map(|name| table.column_index(name))
        .transpose()?;

    for (id, timeline) in timelines.iter() {
        let id_value = id_cell(id);
        match target.mode {
            AssignMode::All => {
                for (key, qualified) in timeline {
                    let slot = matching_row(table, id_index, &id_value, time_index, key);
                    for (label, value) in qualified.iter() {
                        let index = ensure_column(table, &prefixed_column(prefix, label))?;
                        match slot {
                            Some(row) => table.set(row, index, value.clone()),
                            None => debug!("no row for {id} at {key}; dropping {prefix} value"),
                        }
                    }
                }
            }
            AssignMode::MostRecent => {
                let Some((key, qualified)) = most_recent(timeline) else {
                    continue;
                };
                let first_row = table.rows_where(id_index, &id_value).first().copied();
                for (label, value) in qualified.iter() {
                    let index = ensure_column(table, &prefixed_column(prefix, label))?;
                    if let Some(row) = first_row {
                        table.set(row, index, dated(value, key, omit_date));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Normalise `"nan"` text to missing and rename `id_column` to `qid`.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when `id_column` is absent.
pub fn cleanup(table: &mut Table, id_column: &str) -> Result<(), TableError> {
    table.replace_everywhere(&Scalar::Text(MISSING_TEXT.to_owned()), &Scalar::Missing);
    table.rename_column(id_column, QID_COLUMN)
}

fn ensure_column(table: &mut Table, name: &str) -> Result<usize, TableError> {
    if table.has_column(name) {
        table.column_index(name)
    } else {
        table.add_column(name, &Scalar::Missing)
    }
}

fn matching_row(
    table: &Table,
    id_index: usize,
    id: &Scalar,
    time_index: Option<usize>,
    key: &TimeKey,
) -> Option<usize> {
    let bucket = Scalar::Text(key.to_string());
    table.rows().iter().position(|cells| {
        cells.get(id_index) == Some(id)
            && time_index.is_none_or(|index| cells.get(index) == Some(&bucket))
    })
}

/// Latest dated entry; the undated slot only when it is the sole entry.
fn most_recent<V>(timeline: &Timeline<V>) -> Option<(&TimeKey, &V)> {
    if timeline.len() == 1 {
        return timeline.iter().next();
    }
    timeline
        .iter()
        .rev()
        .find(|(key, _)| **key != TimeKey::NoDate)
        .or_else(|| timeline.iter().next())
}

fn dated(value: &Scalar, key: &TimeKey, omit_date: bool) -> Scalar {
    if omit_date || value.is_missing() {
        value.clone()
    } else {
        Scalar::Text(format!("{value} ({key})"))
    }
}
