//! # Fonts
//!
//! Measurement runs against the standard PDF fonts, so a report renders the
//! same everywhere without embedding anything. Family names from the layout
//! markup are mapped onto one of the three standard families; weight and
//! style pick the face within it.

pub mod metrics;

use std::collections::HashMap;

pub use metrics::StandardFontMetrics;

use crate::style::FontDescription;

/// The standard families the engine can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFamily {
    Helvetica,
    Times,
    Courier,
}

impl BaseFamily {
    /// Best guess for a family name: monospace names map to Courier, serif
    /// names to Times, everything else to Helvetica.
    pub fn guess(family: &str) -> Self {
        let name = family.to_ascii_lowercase();
        if name.contains("mono") || name.contains("courier") || name.contains("typewriter") {
            BaseFamily::Courier
        } else if name.contains("sans") || name.contains("helvetica") || name.contains("arial") {
            BaseFamily::Helvetica
        } else if name.contains("serif") || name.contains("times") || name.contains("roman") {
            BaseFamily::Times
        } else {
            BaseFamily::Helvetica
        }
    }
}

/// The twelve text faces of the standard PDF fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    pub fn select(family: BaseFamily, bold: bool, slanted: bool) -> Self {
        match (family, bold, slanted) {
            (BaseFamily::Helvetica, false, false) => Self::Helvetica,
            (BaseFamily::Helvetica, true, false) => Self::HelveticaBold,
            (BaseFamily::Helvetica, false, true) => Self::HelveticaOblique,
            (BaseFamily::Helvetica, true, true) => Self::HelveticaBoldOblique,
            (BaseFamily::Times, false, false) => Self::TimesRoman,
            (BaseFamily::Times, true, false) => Self::TimesBold,
            (BaseFamily::Times, false, true) => Self::TimesItalic,
            (BaseFamily::Times, true, true) => Self::TimesBoldItalic,
            (BaseFamily::Courier, false, false) => Self::Courier,
            (BaseFamily::Courier, true, false) => Self::CourierBold,
            (BaseFamily::Courier, false, true) => Self::CourierOblique,
            (BaseFamily::Courier, true, true) => Self::CourierBoldOblique,
        }
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            // Oblique faces share the upright widths.
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            Self::TimesRoman => &metrics::TIMES_ROMAN,
            Self::TimesBold => &metrics::TIMES_BOLD,
            Self::TimesItalic => &metrics::TIMES_ITALIC,
            Self::TimesBoldItalic => &metrics::TIMES_BOLD_ITALIC,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                &metrics::COURIER
            }
        }
    }
}

/// Maps family names to faces and measures strings.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    aliases: HashMap<String, BaseFamily>,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a family name to a base family, overriding the name heuristic.
    pub fn register_alias(&mut self, family: &str, base: BaseFamily) {
        self.aliases.insert(family.to_ascii_lowercase(), base);
    }

    pub fn resolve(&self, font: &FontDescription) -> StandardFont {
        let family = self
            .aliases
            .get(&font.family.to_ascii_lowercase())
            .copied()
            .unwrap_or_else(|| BaseFamily::guess(&font.family));
        StandardFont::select(family, font.weight.is_bold(), font.style.is_slanted())
    }

    /// Advance of one character in points, stretch applied.
    pub fn char_width(&self, ch: char, font: &FontDescription) -> f64 {
        self.resolve(font).metrics().char_width(ch, font.size) * font.stretch.factor()
    }

    /// Width of a string in points, stretch applied.
    pub fn measure_string(&self, text: &str, font: &FontDescription) -> f64 {
        self.resolve(font).metrics().measure_string(text, font.size) * font.stretch.factor()
    }

    pub fn line_height(&self, font: &FontDescription) -> f64 {
        font.size * crate::text::LINE_HEIGHT_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FontStretch, FontStyle, FontWeight};

    fn font(family: &str) -> FontDescription {
        FontDescription {
            family: family.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn family_names_map_to_standard_faces() {
        let ctx = FontContext::new();
        assert_eq!(ctx.resolve(&font("Serif")), StandardFont::TimesRoman);
        assert_eq!(ctx.resolve(&font("Sans Serif")), StandardFont::Helvetica);
        assert_eq!(ctx.resolve(&font("DejaVu Sans Mono")), StandardFont::Courier);
        assert_eq!(ctx.resolve(&font("Comic")), StandardFont::Helvetica);
    }

    #[test]
    fn weight_and_style_select_face() {
        let ctx = FontContext::new();
        let mut f = font("Times");
        f.weight = FontWeight::Semibold;
        f.style = FontStyle::Italic;
        assert_eq!(ctx.resolve(&f), StandardFont::TimesBoldItalic);
        f.weight = FontWeight::Medium;
        f.style = FontStyle::Oblique;
        assert_eq!(ctx.resolve(&f), StandardFont::TimesItalic);
    }

    #[test]
    fn bold_is_wider() {
        let ctx = FontContext::new();
        let regular = font("Helvetica");
        let mut bold = regular.clone();
        bold.weight = FontWeight::Bold;
        assert!(ctx.measure_string("Amount", &bold) > ctx.measure_string("Amount", &regular));
    }

    #[test]
    fn stretch_scales_width() {
        let ctx = FontContext::new();
        let normal = font("Courier");
        let mut condensed = normal.clone();
        condensed.stretch = FontStretch::Condensed;
        let w = ctx.measure_string("abcd", &normal);
        assert!((w - 24.0).abs() < 1e-9);
        assert!((ctx.measure_string("abcd", &condensed) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn alias_overrides_guess() {
        let mut ctx = FontContext::new();
        ctx.register_alias("Corporate", BaseFamily::Times);
        assert_eq!(ctx.resolve(&font("corporate")), StandardFont::TimesRoman);
    }
}
