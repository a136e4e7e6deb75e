//! Reshaping helpers for finished tables.

use std::cmp::Ordering;

use wikirepo_core::Scalar;

use super::{Table, TableError};

/// Split `"value (date)"` cells of `column` into the value and a
/// `{column}_date` column placed right after it.
///
/// Values are coerced back to numbers where possible. Cells without a date
/// suffix keep their value and get a missing date.
///
/// ```
/// use wikirepo_core::Scalar;
/// use wikirepo_query::table::{Table, post::split_value_dates};
///
/// let mut table = Table::new(["location", "population"]);
/// table.push_row(vec!["Germany".into(), "83019213 (2019-01-01)".into()])?;
/// split_value_dates(&mut table, "population")?;
///
/// assert_eq!(table.columns(), ["location", "population", "population_date"]);
/// assert_eq!(table.cell(0, "population")?, &Scalar::Int(83_019_213));
/// assert_eq!(table.cell(0, "population_date")?, &Scalar::from("2019-01-01"));
/// # Ok::<(), wikirepo_query::table::TableError>(())
/// ```
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when `column` is absent and
/// [`TableError::DuplicateColumn`] when the date column already exists.
pub fn split_value_dates(table: &mut Table, column: &str) -> Result<(), TableError> {
    let index = table.column_index(column)?;
    let mut dates = Vec::with_capacity(table.len());
    let mut values = Vec::with_capacity(table.len());
    for cell in table.column(column)? {
        let split = cell.as_text().and_then(|text| {
            let (value, rest) = text.split_once(" (")?;
            Some((value, rest.trim_end_matches(')')))
        });
        match split {
            Some((value, date)) => {
                values.push(Scalar::coerce(value));
                dates.push(Scalar::Text(date.to_owned()));
            }
            None => {
                values.push(cell.clone());
                dates.push(Scalar::Missing);
            }
        }
    }
    for (row, value) in values.into_iter().enumerate() {
        table.set(row, index, value);
    }
    table.insert_column(index.saturating_add(1), format!("{column}_date"), dates)
}

/// Rows and columns combined by [`sum_location_values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationSum<'a> {
    /// Location whose values change.
    pub target: &'a str,
    /// Location supplying the values.
    pub source: &'a str,
    /// Column holding location labels.
    pub location_column: &'a str,
    /// Column holding time buckets, if the table has one.
    pub time_column: Option<&'a str>,
    /// Column holding the values.
    pub value_column: &'a str,
    /// Subtract instead of add.
    pub subtract: bool,
    /// Remove the source rows afterwards.
    pub drop_source: bool,
}

/// Add (or subtract) the source location's values to the target location's,
/// bucket by bucket.
///
/// Missing operands yield a missing result.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] for absent columns and
/// [`TableError::Arithmetic`] for text values or integer overflow.
pub fn sum_location_values(table: &mut Table, sum: &LocationSum<'_>) -> Result<(), TableError> {
    let location = table.column_index(sum.location_column)?;
    let value = table.column_index(sum.value_column)?;
    let time = sum
        .time_column
        .map(|name| table.column_index(name))
        .transpose()?;
    let target = Scalar::from(sum.target);
    let source = Scalar::from(sum.source);

    let mut updates = Vec::new();
    for target_row in table.rows_where(location, &target) {
        let bucket = time.and_then(|index| cell_at(table, target_row, index));
        let Some(source_row) = table
            .rows_where(location, &source)
            .into_iter()
            .find(|&row| time.is_none_or(|index| cell_at(table, row, index) == bucket))
        else {
            continue;
        };
        let left = cell_at(table, target_row, value).cloned().unwrap_or_default();
        let right = cell_at(table, source_row, value).cloned().unwrap_or_default();
        let combined = combine(sum.value_column, &left, &right, sum.subtract)?;
        updates.push((target_row, combined));
    }
    for (row, result) in updates {
        table.set(row, value, result);
    }

    if sum.drop_source {
        table.retain_rows(|cells| cells.get(location) != Some(&source));
    }
    Ok(())
}

fn cell_at(table: &Table, row: usize, column: usize) -> Option<&Scalar> {
    table.rows().get(row).and_then(|cells| cells.get(column))
}

#[expect(
    clippy::float_arithmetic,
    reason = "values may be fractional quantities"
)]
fn combine(
    column: &str,
    left: &Scalar,
    right: &Scalar,
    subtract: bool,
) -> Result<Scalar, TableError> {
    let incompatible = || TableError::Arithmetic {
        column: column.to_owned(),
        left: left.to_string(),
        right: right.to_string(),
    };
    let floats = |a: f64, b: f64| Scalar::Float(if subtract { a - b } else { a + b });
    let result = match (left, right) {
        (Scalar::Missing, _) | (_, Scalar::Missing) => Scalar::Missing,
        (Scalar::Int(a), Scalar::Int(b)) => {
            let combined = if subtract {
                a.checked_sub(*b)
            } else {
                a.checked_add(*b)
            };
            Scalar::Int(combined.ok_or_else(incompatible)?)
        }
        (Scalar::Float(a), Scalar::Float(b)) => floats(*a, *b),
        (Scalar::Int(a), Scalar::Float(b)) => floats(int_as_float(*a), *b),
        (Scalar::Float(a), Scalar::Int(b)) => floats(*a, int_as_float(*b)),
        _ => return Err(incompatible()),
    };
    Ok(result)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "integers mixed with floats are compared and combined as floats"
)]
const fn int_as_float(value: i64) -> f64 {
    value as f64
}

/// Give every row of a location the first present value of `value_column`
/// among that location's rows.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] for absent columns.
pub fn fill_by_location(
    table: &mut Table,
    location_column: &str,
    value_column: &str,
) -> Result<(), TableError> {
    let location = table.column_index(location_column)?;
    let value = table.column_index(value_column)?;
    let mut fills: Vec<(Scalar, Scalar)> = Vec::new();
    for cells in table.rows() {
        let (Some(place), Some(cell)) = (cells.get(location), cells.get(value)) else {
            continue;
        };
        if !cell.is_missing() && !fills.iter().any(|(known, _)| known == place) {
            fills.push((place.clone(), cell.clone()));
        }
    }
    for (place, fill) in fills {
        for row in table.rows_where(location, &place) {
            table.set(row, value, fill.clone());
        }
    }
    Ok(())
}

/// Fill missing numbers of `value_column` by linear interpolation within
/// each location.
///
/// A location's rows are taken in table order and treated as evenly spaced.
/// Gaps between two numbers are filled along the line joining them, gaps
/// after the last number repeat it, and gaps before the first number stay
/// missing. Text and boolean cells are kept and do not anchor the line.
///
/// ```
/// use wikirepo_core::Scalar;
/// use wikirepo_query::table::{Table, post::interpolate_by_location};
///
/// let mut table = Table::new(["location", "population"]);
/// for value in [Scalar::Int(100), Scalar::Missing, Scalar::Int(300)] {
///     table.push_row(vec!["Germany".into(), value])?;
/// }
/// interpolate_by_location(&mut table, "location", "population")?;
///
/// assert_eq!(table.cell(1, "population")?, &Scalar::Float(200.0));
/// # Ok::<(), wikirepo_query::table::TableError>(())
/// ```
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] for absent columns.
pub fn interpolate_by_location(
    table: &mut Table,
    location_column: &str,
    value_column: &str,
) -> Result<(), TableError> {
    let location = table.column_index(location_column)?;
    let value = table.column_index(value_column)?;
    let mut places: Vec<Scalar> = Vec::new();
    for cells in table.rows() {
        if let Some(place) = cells.get(location)
            && !places.contains(place)
        {
            places.push(place.clone());
        }
    }
    for place in places {
        let rows = table.rows_where(location, &place);
        let series: Vec<Scalar> = rows
            .iter()
            .map(|&row| cell_at(table, row, value).cloned().unwrap_or_default())
            .collect();
        for (row, filled) in rows.into_iter().zip(interpolate_series(&series)) {
            if let Some(cell) = filled {
                table.set(row, value, cell);
            }
        }
    }
    Ok(())
}

fn interpolate_series(series: &[Scalar]) -> Vec<Option<Scalar>> {
    let anchors: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(position, cell)| numeric(cell).map(|number| (position, number)))
        .collect();
    series
        .iter()
        .enumerate()
        .map(|(position, cell)| {
            if !cell.is_missing() {
                return None;
            }
            let before = anchors.iter().rev().find(|(at, _)| *at < position);
            let after = anchors.iter().find(|(at, _)| *at > position);
            match (before, after) {
                (Some(&(left, start)), Some(&(right, end))) => Some(Scalar::Float(along(
                    start,
                    end,
                    position.saturating_sub(left),
                    right.saturating_sub(left),
                ))),
                (Some(&(left, _)), None) => series.get(left).cloned(),
                (None, _) => None,
            }
        })
        .collect()
}

const fn numeric(cell: &Scalar) -> Option<f64> {
    match cell {
        Scalar::Int(int) => Some(int_as_float(*int)),
        Scalar::Float(float) => Some(*float),
        _ => None,
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "interpolated values lie on the line between two anchors"
)]
fn along(start: f64, end: f64, step: usize, steps: usize) -> f64 {
    start + (end - start) * count_as_float(step) / count_as_float(steps)
}

/// Occurrences of each present value in `column`, sorted by value.
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when `column` is absent.
pub fn count_values(table: &Table, column: &str) -> Result<Vec<(Scalar, usize)>, TableError> {
    let mut counts: Vec<(Scalar, usize)> = Vec::new();
    for cell in table.column(column)? {
        if cell.is_missing() {
            continue;
        }
        match counts.iter_mut().find(|(value, _)| value == cell) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => counts.push((cell.clone(), 1)),
        }
    }
    counts.sort_by(|(a, _), (b, _)| compare(a, b));
    Ok(counts)
}

/// Share of rows holding each present value in `column`, sorted by value.
///
/// ```
/// use wikirepo_query::table::{Table, post::value_shares};
///
/// let mut table = Table::new(["fh_category"]);
/// for category in ["free", "free", "not free", "partly free"] {
///     table.push_row(vec![category.into()])?;
/// }
/// let shares = value_shares(&table, "fh_category")?;
/// assert_eq!(shares.first().map(|(_, share)| *share), Some(0.5));
/// # Ok::<(), wikirepo_query::table::TableError>(())
/// ```
///
/// # Errors
///
/// Returns [`TableError::UnknownColumn`] when `column` is absent.
#[expect(clippy::float_arithmetic, reason = "shares are fractions of the row count")]
pub fn value_shares(table: &Table, column: &str) -> Result<Vec<(Scalar, f64)>, TableError> {
    let rows = count_as_float(table.len());
    Ok(count_values(table, column)?
        .into_iter()
        .map(|(value, count)| (value, count_as_float(count) / rows))
        .collect())
}

fn count_as_float(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

fn rank(value: &Scalar) -> u8 {
    match value {
        Scalar::Missing => 0,
        Scalar::Bool(_) => 1,
        Scalar::Int(_) | Scalar::Float(_) => 2,
        Scalar::Text(_) => 3,
    }
}

fn compare(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::Int(x), Scalar::Int(y)) => x.cmp(y),
        (Scalar::Float(x), Scalar::Float(y)) => x.total_cmp(y),
        (Scalar::Int(x), Scalar::Float(y)) => int_as_float(*x).total_cmp(y),
        (Scalar::Float(x), Scalar::Int(y)) => x.total_cmp(&int_as_float(*y)),
        (Scalar::Text(x), Scalar::Text(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
