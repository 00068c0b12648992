use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{MaskError, MaskResult};
use crate::palette::color::HexColor;

/// Alpha applied to every annotation paint so strokes stay semi-transparent overlays.
pub const PAINT_ALPHA: f64 = 0.5;

const DEFAULT_COLORS: &[(&str, &str, Rgba8)] = &[
    ("orange", "Orange", Rgba8::opaque(0xF9, 0x73, 0x16)),
    ("purple", "Purple", Rgba8::opaque(0xA8, 0x55, 0xF7)),
    ("green", "Green", Rgba8::opaque(0x22, 0xC5, 0x5E)),
    ("blue", "Blue", Rgba8::opaque(0x3B, 0x82, 0xF6)),
    ("red", "Red", Rgba8::opaque(0xEF, 0x44, 0x44)),
    ("yellow", "Yellow", Rgba8::opaque(0xEA, 0xB3, 0x08)),
];

/// Stable short token identifying a color definition (e.g. `orange`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(String);

impl ColorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ColorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for ColorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One annotation color: identity, display label and display color.
///
/// The paint actually applied to strokes is derived: the display color at [`PAINT_ALPHA`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDefinition {
    pub id: ColorId,
    pub name: String,
    pub hex: HexColor,
}

impl ColorDefinition {
    pub fn new(id: impl Into<ColorId>, name: impl Into<String>, hex: Rgba8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hex: HexColor(hex),
        }
    }

    /// Stroke paint: the display color at [`PAINT_ALPHA`].
    pub fn paint_value(&self) -> Rgba8 {
        self.hex.0.with_alpha(PAINT_ALPHA)
    }

    /// CSS form of [`ColorDefinition::paint_value`], e.g. `rgba(249, 115, 22, 0.5)`.
    pub fn paint_css(&self) -> String {
        self.paint_value().to_css()
    }
}

/// Ordered, validated list of color definitions.
///
/// Ids and derived paint values are unique; stroke-to-color matching relies on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<ColorDefinition>,
}

impl Palette {
    pub fn new(colors: Vec<ColorDefinition>) -> MaskResult<Self> {
        if colors.is_empty() {
            return Err(MaskError::validation("palette must define at least one color"));
        }

        let mut ids = HashSet::new();
        let mut paints = HashSet::new();
        for c in &colors {
            let id = c.id.as_str();
            if id.trim().is_empty() {
                return Err(MaskError::validation("palette color id must be non-empty"));
            }
            // Ids end up in output file names.
            if id.contains(['/', '\\']) || id.contains("..") {
                return Err(MaskError::validation(format!(
                    "palette color id '{id}' must not contain path separators or '..'"
                )));
            }
            if !ids.insert(c.id.clone()) {
                return Err(MaskError::validation(format!(
                    "palette color id '{}' is defined twice",
                    c.id
                )));
            }
            if !paints.insert(c.paint_value()) {
                return Err(MaskError::validation(format!(
                    "palette color '{}' shares its paint value {} with another color",
                    c.id,
                    c.paint_css()
                )));
            }
        }

        Ok(Self { colors })
    }

    /// The built-in annotation palette.
    pub fn default_palette() -> Self {
        Self {
            colors: DEFAULT_COLORS
                .iter()
                .map(|&(id, name, hex)| ColorDefinition::new(id, name, hex))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ColorDefinition> {
        self.colors.iter().find(|c| c.id.as_str() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColorDefinition> {
        self.colors.iter()
    }

    pub fn colors(&self) -> &[ColorDefinition] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_palette()
    }
}

impl<'de> Deserialize<'de> for Palette {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let colors = Vec::<ColorDefinition>::deserialize(deserializer)?;
        Self::new(colors).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a ColorDefinition;
    type IntoIter = std::slice::Iter<'a, ColorDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/palette/definition.rs"]
mod tests;
