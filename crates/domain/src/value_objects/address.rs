//! Postal address as returned by reverse geocoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between rendered address lines
const LINE_SEPARATOR: &str = ", ";

/// Up to three formatted address lines: street, locality, region/country
///
/// Any line may be absent. Rendering skips absent and empty lines.
///
/// ```
/// use domain::value_objects::Address;
///
/// let address = Address::from_lines([
///     Some("123 Main St".to_string()),
///     None,
///     Some("Springfield".to_string()),
/// ]);
/// assert_eq!(address.to_string(), "123 Main St, Springfield");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    lines: [Option<String>; Self::MAX_LINES],
}

impl Address {
    /// Number of lines an address can hold
    pub const MAX_LINES: usize = 3;

    /// Build an address from ordered lines; lines beyond the third are ignored
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut address = Self::default();
        for (slot, line) in address.lines.iter_mut().zip(lines) {
            *slot = line;
        }
        address
    }

    /// Get a line by index (0 = street, 1 = locality, 2 = region/country)
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).and_then(Option::as_deref)
    }

    /// Whether no line carries text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present_lines().next().is_none()
    }

    fn present_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter_map(Option::as_deref)
            .filter(|line| !line.is_empty())
    }

    /// Render present lines joined with ", "
    #[must_use]
    pub fn render(&self) -> String {
        self.present_lines().collect::<Vec<_>>().join(LINE_SEPARATOR)
    }

    /// Render an optional address; `None` renders to an empty string
    #[must_use]
    pub fn render_optional(address: Option<&Self>) -> String {
        address.map(Self::render).unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
