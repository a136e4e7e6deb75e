//! Cell values produced by claim extraction and stored in tables.

use std::fmt;

/// A single extracted value.
///
/// `Missing` is the dataset-wide placeholder for absent data. When a value is
/// rendered into text (for example while joining colliding claims) it prints
/// as `nan`, and table cleanup turns such artefacts back into `Missing`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Scalar {
    /// No value.
    #[default]
    Missing,
    /// Presence flag.
    Bool(bool),
    /// Integer quantity.
    Int(i64),
    /// Fractional quantity.
    Float(f64),
    /// Free text or a resolved entity label.
    Text(String),
}

/// Rendering of [`Scalar::Missing`] inside text.
pub const MISSING_TEXT: &str = "nan";

impl Scalar {
    /// Coerce text into the narrowest scalar: integer, then float, then text.
    ///
    /// ```
    /// use wikirepo_core::Scalar;
    ///
    /// assert_eq!(Scalar::coerce("+83019213"), Scalar::Int(83_019_213));
    /// assert_eq!(Scalar::coerce("97.5"), Scalar::Float(97.5));
    /// assert_eq!(Scalar::coerce("Flawed democracy"), Scalar::Text("Flawed democracy".into()));
    /// ```
    #[must_use]
    pub fn coerce(text: &str) -> Self {
        if let Ok(int) = text.parse::<i64>() {
            return Self::Int(int);
        }
        match text.parse::<f64>() {
            Ok(float) if float.is_nan() => Self::Missing,
            Ok(float) => Self::Float(float),
            Err(_) => Self::Text(text.to_owned()),
        }
    }

    /// Whether the value is [`Scalar::Missing`].
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Borrow the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str(MISSING_TEXT),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Scalar {
    fn from(int: i64) -> Self {
        Self::Int(int)
    }
}

impl From<bool> for Scalar {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", Scalar::Int(42))]
    #[case("-3", Scalar::Int(-3))]
    #[case("1.25", Scalar::Float(1.25))]
    #[case("nan", Scalar::Missing)]
    #[case("DE", Scalar::Text("DE".into()))]
    fn coerce_prefers_narrowest_type(#[case] raw: &str, #[case] expected: Scalar) {
        assert_eq!(Scalar::coerce(raw), expected);
    }

    #[rstest]
    fn missing_renders_as_nan() {
        assert_eq!(Scalar::Missing.to_string(), "nan");
        assert_eq!(format!("{}, {}", Scalar::Int(1), Scalar::Missing), "1, nan");
    }
}
