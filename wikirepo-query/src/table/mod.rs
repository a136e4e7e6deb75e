//! Result tables: named columns over rows of [`Scalar`] cells.
//!
//! Tables are built in three steps. [`base_table`] lays out one row per
//! location and time bucket, [`assign_column`] or [`assign_prefixed_columns`]
//! writes timeline values into it, and [`cleanup`] normalises artefacts and
//! names the join column `qid`. The helpers in [`post`] reshape finished
//! tables.

mod assemble;
pub mod post;

pub use assemble::{
    AssignMode, Assignment, assign_column, assign_prefixed_columns, base_table, cleanup,
};

use serde_json::{Map, Value};
use thiserror::Error;
use wikirepo_core::{EntityId, Scalar, StoreError};

/// Name of the join column every finished table carries.
pub const QID_COLUMN: &str = "qid";

/// Errors raised while building or reshaping tables.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableError {
    /// The named column does not exist.
    #[error("unknown column '{name}'")]
    UnknownColumn {
        /// Requested column.
        name: String,
    },
    /// A column with this name already exists.
    #[error("column '{name}' already exists")]
    DuplicateColumn {
        /// Offending column.
        name: String,
    },
    /// A row does not match the table width.
    #[error("row has {found} cells but the table has {expected} columns")]
    RowWidth {
        /// Number of columns.
        expected: usize,
        /// Number of cells supplied.
        found: usize,
    },
    /// A flat location list was combined with a non-zero depth.
    #[error("a flat location list only supports depth 0, got depth {depth}")]
    FlatDepth {
        /// Requested depth.
        depth: usize,
    },
    /// The requested depth differs from the depth of the location tree.
    #[error("requested depth {given} does not match the location tree depth {derived}")]
    DepthMismatch {
        /// Requested depth.
        given: usize,
        /// Depth derived from the tree.
        derived: usize,
    },
    /// Values of the column cannot be combined arithmetically.
    #[error("cannot combine values '{left}' and '{right}' in column '{column}'")]
    Arithmetic {
        /// Column being combined.
        column: String,
        /// Left operand.
        left: String,
        /// Right operand.
        right: String,
    },
    /// Labels for the skeleton could not be fetched.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Records could not be serialised.
    #[error("failed to serialise table records")]
    Serialise(#[source] serde_json::Error),
}

/// Location column for `depth`: `location`, `sub_lctn`, `sub_sub_lctn`, ...
///
/// ```
/// use wikirepo_query::table::location_column;
///
/// assert_eq!(location_column(0), "location");
/// assert_eq!(location_column(2), "sub_sub_lctn");
/// ```
#[must_use]
pub fn location_column(depth: usize) -> String {
    if depth == 0 {
        "location".to_owned()
    } else {
        format!("{}lctn", "sub_".repeat(depth))
    }
}

/// Identifier column for `depth`: `qid`, `sub_qid`, `sub_sub_qid`, ...
#[must_use]
pub fn id_column(depth: usize) -> String {
    format!("{}qid", "sub_".repeat(depth))
}

/// Column generated for `label` under `prefix`.
///
/// ```
/// use wikirepo_query::table::prefixed_column;
///
/// assert_eq!(prefixed_column("mem", "European Union"), "mem_european_union");
/// ```
#[must_use]
pub fn prefixed_column(prefix: &str, label: &str) -> String {
    format!("{prefix}_{}", label.replace(' ', "_").to_lowercase())
}

/// Cell holding an entity identifier.
#[must_use]
pub fn id_cell(id: EntityId) -> Scalar {
    Scalar::Text(id.to_string())
}

/// Rectangular table of scalars.
///
/// # Examples
///
/// ```
/// use wikirepo_core::Scalar;
/// use wikirepo_query::table::Table;
///
/// let mut table = Table::new(["location", "population"]);
/// table.push_row(vec!["Germany".into(), Scalar::Int(83_019_213)])?;
/// assert_eq!(table.cell(0, "population")?, &Scalar::Int(83_019_213));
/// # Ok::<(), wikirepo_query::table::TableError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column called `name` exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of column `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when absent.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::UnknownColumn {
                name: name.to_owned(),
            })
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowWidth`] when the row does not match the
    /// column count.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Cell at `row` in column `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] for an unknown column; rows
    /// beyond the end read as [`Scalar::Missing`].
    pub fn cell(&self, row: usize, name: &str) -> Result<&Scalar, TableError> {
        let index = self.column_index(name)?;
        Ok(self
            .rows
            .get(row)
            .and_then(|cells| cells.get(index))
            .unwrap_or(&Scalar::Missing))
    }

    /// Overwrite the cell at `row`, `column`; out-of-range positions are
    /// ignored.
    pub fn set(&mut self, row: usize, column: usize, value: Scalar) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            *cell = value;
        }
    }

    /// Values of column `name` in row order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when absent.
    pub fn column(&self, name: &str) -> Result<Vec<&Scalar>, TableError> {
        let index = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|cells| cells.get(index).unwrap_or(&Scalar::Missing))
            .collect())
    }

    /// Indices of rows whose `column` cell equals `value`.
    #[must_use]
    pub fn rows_where(&self, column: usize, value: &Scalar) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.get(column) == Some(value))
            .map(|(row, _)| row)
            .collect()
    }

    /// Append a column filled with `fill`, returning its position.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] when the name is taken.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        fill: &Scalar,
    ) -> Result<usize, TableError> {
        let position = self.columns.len();
        self.insert_column(position, name, vec![fill.clone(); self.rows.len()])?;
        Ok(position)
    }

    /// Insert a column at `position` with one value per row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] when the name is taken and
    /// [`TableError::RowWidth`] when `values` does not cover every row.
    pub fn insert_column(
        &mut self,
        position: usize,
        name: impl Into<String>,
        values: Vec<Scalar>,
    ) -> Result<(), TableError> {
        let column = name.into();
        if self.has_column(&column) {
            return Err(TableError::DuplicateColumn { name: column });
        }
        if values.len() != self.rows.len() {
            return Err(TableError::RowWidth {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        let at = position.min(self.columns.len());
        self.columns.insert(at, column);
        for (cells, value) in self.rows.iter_mut().zip(values) {
            cells.insert(at, value);
        }
        Ok(())
    }

    /// Rename column `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when `from` is absent and
    /// [`TableError::DuplicateColumn`] when `to` is taken by another column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), TableError> {
        let index = self.column_index(from)?;
        if from != to && self.has_column(to) {
            return Err(TableError::DuplicateColumn { name: to.to_owned() });
        }
        if let Some(slot) = self.columns.get_mut(index) {
            to.clone_into(slot);
        }
        Ok(())
    }

    /// Remove column `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when absent.
    pub fn drop_column(&mut self, name: &str) -> Result<(), TableError> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        for cells in &mut self.rows {
            if index < cells.len() {
                cells.remove(index);
            }
        }
        Ok(())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Scalar]) -> bool) {
        self.rows.retain(|cells| keep(cells));
    }

    /// Replace exact text values in column `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when absent.
    pub fn replace_values(
        &mut self,
        name: &str,
        replacements: &[(&str, &str)],
    ) -> Result<(), TableError> {
        let index = self.column_index(name)?;
        for cell in self.rows.iter_mut().filter_map(|cells| cells.get_mut(index)) {
            let replacement = cell.as_text().and_then(|text| {
                replacements
                    .iter()
                    .find(|(from, _)| *from == text)
                    .map(|(_, to)| *to)
            });
            if let Some(to) = replacement {
                *cell = Scalar::Text(to.to_owned());
            }
        }
        Ok(())
    }

    /// Replace every cell matching `from` anywhere in the table.
    pub fn replace_everywhere(&mut self, from: &Scalar, to: &Scalar) {
        for cell in self.rows.iter_mut().flatten() {
            if cell == from {
                *cell = to.clone();
            }
        }
    }

    /// Fill missing cells of column `name` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when absent.
    pub fn fill_missing(&mut self, name: &str, value: &Scalar) -> Result<(), TableError> {
        let index = self.column_index(name)?;
        for cell in self.rows.iter_mut().filter_map(|cells| cells.get_mut(index)) {
            if cell.is_missing() {
                *cell = value.clone();
            }
        }
        Ok(())
    }

    /// Inner join with `other` on the `keys` columns.
    ///
    /// Output rows follow this table's order, then `other`'s order for
    /// repeated matches. Non-key columns of `other` whose names already
    /// exist here are dropped. Missing key cells match each other, so rows of
    /// locations without sub-locations survive the join.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] when a key is absent from either
    /// table.
    pub fn inner_join(&self, other: &Self, keys: &[&str]) -> Result<Self, TableError> {
        let left_keys = keys
            .iter()
            .map(|key| self.column_index(key))
            .collect::<Result<Vec<_>, _>>()?;
        let right_keys = keys
            .iter()
            .map(|key| other.column_index(key))
            .collect::<Result<Vec<_>, _>>()?;
        let carried: Vec<usize> = other
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.has_column(name))
            .map(|(index, _)| index)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(
            carried
                .iter()
                .filter_map(|&index| other.columns.get(index).cloned()),
        );
        let mut joined = Self::new(columns);

        for left in &self.rows {
            let left_key: Vec<Option<&Scalar>> = left_keys.iter().map(|&i| left.get(i)).collect();
            for right in &other.rows {
                let matches = right_keys
                    .iter()
                    .zip(&left_key)
                    .all(|(&i, cell)| right.get(i) == *cell);
                if !matches {
                    continue;
                }
                let mut row = left.clone();
                row.extend(
                    carried
                        .iter()
                        .map(|&index| right.get(index).cloned().unwrap_or_default()),
                );
                joined.rows.push(row);
            }
        }
        Ok(joined)
    }

    /// Rows as JSON objects keyed by column name.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Serialise`] when a cell cannot be represented.
    pub fn to_records(&self) -> Result<Vec<Map<String, Value>>, TableError> {
        self.rows
            .iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(|(name, cell)| {
                        serde_json::to_value(cell)
                            .map(|value| (name.clone(), value))
                            .map_err(TableError::Serialise)
                    })
                    .collect()
            })
            .collect()
    }

    /// Rows as a JSON array string.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Serialise`] when a cell cannot be represented.
    pub fn to_json(&self) -> Result<String, TableError> {
        let records = self.to_records()?;
        serde_json::to_string(&records).map_err(TableError::Serialise)
    }
}

#[cfg(test)]
mod tests;
