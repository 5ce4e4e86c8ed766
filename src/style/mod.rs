//! # Style Cascade
//!
//! Fonts and paddings declared in the layout markup are partial: every field
//! is either set or inherited. Resolution walks from the root of the report
//! tree to a cell, laying each node's explicit fields over its parent's
//! resolved value. The root of the cascade is the default cell's font laid
//! over the built-in default (`Serif 10`, everything else normal).
//!
//! Resolution is pure. The report tree is immutable once built, so resolving
//! a node's font on first use during a pass is always correct.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Edges;

/// Family used when nothing in the cascade names one.
pub const DEFAULT_FAMILY: &str = "Serif";
/// Size in points used when nothing in the cascade sets one.
pub const DEFAULT_SIZE: f64 = 10.0;
/// Left/right padding of a cell when neither the cell, the default cell nor
/// any padding declaration sets one.
pub const CELL_PAD_DEFAULT: f64 = 10.0;

/// Returned when a named style value is not one of the recognised names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName;

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unrecognised name")
    }
}

impl std::error::Error for UnknownName {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Oblique,
    Italic,
}

impl FontStyle {
    pub fn is_slanted(self) -> bool {
        matches!(self, FontStyle::Oblique | FontStyle::Italic)
    }
}

impl FromStr for FontStyle {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(FontStyle::Normal),
            "oblique" => Ok(FontStyle::Oblique),
            "italic" => Ok(FontStyle::Italic),
            _ => Err(UnknownName),
        }
    }
}

/// The ten named weights of the layout markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontWeight {
    Thin,
    Ultralight,
    Light,
    Book,
    #[default]
    Normal,
    Medium,
    Semibold,
    Bold,
    Heavy,
    Ultraheavy,
}

impl FontWeight {
    /// Numeric weight on the usual 100-1000 scale.
    pub fn numeric(self) -> u32 {
        match self {
            FontWeight::Thin => 100,
            FontWeight::Ultralight => 200,
            FontWeight::Light => 300,
            FontWeight::Book => 380,
            FontWeight::Normal => 400,
            FontWeight::Medium => 500,
            FontWeight::Semibold => 600,
            FontWeight::Bold => 700,
            FontWeight::Heavy => 900,
            FontWeight::Ultraheavy => 1000,
        }
    }

    pub fn is_bold(self) -> bool {
        self >= FontWeight::Semibold
    }
}

impl FromStr for FontWeight {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thin" => Ok(FontWeight::Thin),
            "ultralight" => Ok(FontWeight::Ultralight),
            "light" => Ok(FontWeight::Light),
            "book" => Ok(FontWeight::Book),
            "normal" => Ok(FontWeight::Normal),
            "medium" => Ok(FontWeight::Medium),
            "semibold" => Ok(FontWeight::Semibold),
            "bold" => Ok(FontWeight::Bold),
            "heavy" => Ok(FontWeight::Heavy),
            "ultraheavy" => Ok(FontWeight::Ultraheavy),
            _ => Err(UnknownName),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
}

impl FromStr for FontVariant {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(FontVariant::Normal),
            "small-caps" => Ok(FontVariant::SmallCaps),
            _ => Err(UnknownName),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl FontStretch {
    /// Horizontal scale applied to glyph advances.
    pub fn factor(self) -> f64 {
        match self {
            FontStretch::UltraCondensed => 0.5,
            FontStretch::ExtraCondensed => 0.625,
            FontStretch::Condensed => 0.75,
            FontStretch::SemiCondensed => 0.875,
            FontStretch::Normal => 1.0,
            FontStretch::SemiExpanded => 1.125,
            FontStretch::Expanded => 1.25,
            FontStretch::ExtraExpanded => 1.5,
            FontStretch::UltraExpanded => 2.0,
        }
    }
}

impl FromStr for FontStretch {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ultra-condensed" => Ok(FontStretch::UltraCondensed),
            "extra-condensed" => Ok(FontStretch::ExtraCondensed),
            "condensed" => Ok(FontStretch::Condensed),
            "semi-condensed" => Ok(FontStretch::SemiCondensed),
            "normal" => Ok(FontStretch::Normal),
            "semi-expanded" => Ok(FontStretch::SemiExpanded),
            "expanded" => Ok(FontStretch::Expanded),
            "extra-expanded" => Ok(FontStretch::ExtraExpanded),
            "ultra-expanded" => Ok(FontStretch::UltraExpanded),
            _ => Err(UnknownName),
        }
    }
}

/// Horizontal placement of text inside a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for TextAlign {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" => Ok(TextAlign::Left),
            "c" => Ok(TextAlign::Center),
            "r" => Ok(TextAlign::Right),
            _ => Err(UnknownName),
        }
    }
}

/// A partial font declaration. `None` means "inherit".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: Option<f64>,
    pub style: Option<FontStyle>,
    pub weight: Option<FontWeight>,
    pub variant: Option<FontVariant>,
    pub stretch: Option<FontStretch>,
}

impl FontSpec {
    pub fn is_empty(&self) -> bool {
        self.family.is_none()
            && self.size.is_none()
            && self.style.is_none()
            && self.weight.is_none()
            && self.variant.is_none()
            && self.stretch.is_none()
    }

    /// Lay the explicitly set fields over an already resolved parent font.
    pub fn resolve(&self, parent: &FontDescription) -> FontDescription {
        FontDescription {
            family: self
                .family
                .as_ref()
                .filter(|f| !f.is_empty())
                .cloned()
                .unwrap_or_else(|| parent.family.clone()),
            size: self.size.filter(|s| *s > 0.0).unwrap_or(parent.size),
            style: self.style.unwrap_or(parent.style),
            weight: self.weight.unwrap_or(parent.weight),
            variant: self.variant.unwrap_or(parent.variant),
            stretch: self.stretch.unwrap_or(parent.stretch),
        }
    }
}

/// A fully resolved font: what the measurement and drawing services receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescription {
    pub family: String,
    pub size: f64,
    pub style: FontStyle,
    pub weight: FontWeight,
    pub variant: FontVariant,
    pub stretch: FontStretch,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            size: DEFAULT_SIZE,
            style: FontStyle::Normal,
            weight: FontWeight::Normal,
            variant: FontVariant::Normal,
            stretch: FontStretch::Normal,
        }
    }
}

impl fmt::Display for FontDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.family)?;
        if self.style != FontStyle::Normal {
            write!(f, " {:?}", self.style)?;
        }
        if self.weight != FontWeight::Normal {
            write!(f, " {:?}", self.weight)?;
        }
        write!(f, " {}", self.size)
    }
}

/// A partial padding declaration (the markup's `padding`/`defaultpadding`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

impl Padding {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }

    pub fn resolve(&self, parent: &Edges) -> Edges {
        Edges {
            top: self.top.unwrap_or(parent.top),
            right: self.right.unwrap_or(parent.right),
            bottom: self.bottom.unwrap_or(parent.bottom),
            left: self.left.unwrap_or(parent.left),
        }
    }
}

/// The root of the padding cascade: cells get a nonzero left/right default,
/// rows get no extra space above or below.
pub fn base_padding() -> Edges {
    Edges {
        top: 0.0,
        right: CELL_PAD_DEFAULT,
        bottom: 0.0,
        left: CELL_PAD_DEFAULT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_inherit() {
        let parent = FontSpec {
            family: Some("Times".to_string()),
            size: Some(12.0),
            ..Default::default()
        }
        .resolve(&FontDescription::default());

        let child = FontSpec::default().resolve(&parent);
        assert_eq!(child.family, "Times");
        assert_eq!(child.size, 12.0);

        let sized = FontSpec {
            size: Some(8.0),
            ..Default::default()
        }
        .resolve(&parent);
        assert_eq!(sized.family, "Times");
        assert_eq!(sized.size, 8.0);
    }

    #[test]
    fn empty_family_counts_as_unset() {
        let spec = FontSpec {
            family: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(spec.resolve(&FontDescription::default()).family, DEFAULT_FAMILY);
    }

    #[test]
    fn default_font_is_serif_ten() {
        let font = FontDescription::default();
        assert_eq!(font.family, "Serif");
        assert_eq!(font.size, 10.0);
        assert_eq!(font.weight, FontWeight::Normal);
        assert_eq!(font.stretch, FontStretch::Normal);
    }

    #[test]
    fn weight_names_cover_ten_levels() {
        let names = [
            "thin", "ultralight", "light", "book", "normal", "medium", "semibold", "bold",
            "heavy", "ultraheavy",
        ];
        let parsed: Vec<FontWeight> = names.iter().map(|n| n.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));
        assert!("black".parse::<FontWeight>().is_err());
        assert!(FontWeight::Semibold.is_bold());
        assert!(!FontWeight::Medium.is_bold());
    }

    #[test]
    fn stretch_names_cover_nine_levels() {
        let names = [
            "ultra-condensed",
            "extra-condensed",
            "condensed",
            "semi-condensed",
            "normal",
            "semi-expanded",
            "expanded",
            "extra-expanded",
            "ultra-expanded",
        ];
        let factors: Vec<f64> = names
            .iter()
            .map(|n| n.parse::<FontStretch>().unwrap().factor())
            .collect();
        assert!(factors.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn align_names() {
        assert_eq!("l".parse::<TextAlign>(), Ok(TextAlign::Left));
        assert_eq!("c".parse::<TextAlign>(), Ok(TextAlign::Center));
        assert_eq!("r".parse::<TextAlign>(), Ok(TextAlign::Right));
        assert!("left".parse::<TextAlign>().is_err());
    }

    #[test]
    fn padding_cascade() {
        let base = base_padding();
        let pad = Padding {
            top: Some(4.0),
            ..Default::default()
        };
        let resolved = pad.resolve(&base);
        assert_eq!(resolved.top, 4.0);
        assert_eq!(resolved.bottom, 0.0);
        assert_eq!(resolved.left, CELL_PAD_DEFAULT);
    }
}
