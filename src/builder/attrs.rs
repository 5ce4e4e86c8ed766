//! Attribute maps and typed attribute parsing.
//!
//! A value that does not parse leaves its field untouched and records an
//! `AttributeParse` diagnostic. Unknown attribute names are never looked at.

use std::str::FromStr;

use crate::error::{Diagnostic, Diagnostics};
use crate::model::{BorderStyle, NodeStyle};
use crate::style::{FontSpec, Padding};

/// Attributes of one element, in document order. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Value of `key`. With duplicate keys the last one wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Reads typed values off one element's attributes.
pub(crate) struct AttrReader<'a> {
    element: &'a str,
    attrs: &'a Attributes,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> AttrReader<'a> {
    pub fn new(element: &'a str, attrs: &'a Attributes, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            element,
            attrs,
            diagnostics,
        }
    }

    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.attrs.get(key)
    }

    pub fn parse_with<T>(
        &mut self,
        key: &str,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        let value = self.attrs.get(key)?;
        let parsed = parse(value.trim());
        if parsed.is_none() {
            self.diagnostics.push(Diagnostic::AttributeParse {
                element: self.element.to_string(),
                attribute: key.to_string(),
                value: value.to_string(),
                expected,
            });
        }
        parsed
    }

    pub fn number(&mut self, key: &str) -> Option<f64> {
        self.parse_with(key, "a number", |v| {
            v.parse::<f64>().ok().filter(|n| n.is_finite())
        })
    }

    /// Integer attributes, widened to points.
    pub fn integer(&mut self, key: &str) -> Option<f64> {
        self.parse_with(key, "an integer", |v| v.parse::<i64>().ok().map(|n| n as f64))
    }

    pub fn named<T: FromStr>(&mut self, key: &str, expected: &'static str) -> Option<T> {
        self.parse_with(key, expected, |v| v.parse().ok())
    }
}

pub(crate) fn apply_font(reader: &mut AttrReader<'_>, font: &mut FontSpec) {
    if let Some(family) = reader.text("family") {
        font.family = Some(family.trim().to_string()).filter(|f| !f.is_empty());
    }
    if let Some(size) = reader.parse_with("size", "a positive number", |v| {
        v.parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
    }) {
        font.size = Some(size);
    }
    if let Some(style) = reader.named("style", "normal, oblique or italic") {
        font.style = Some(style);
    }
    if let Some(weight) = reader.named("weight", "a weight from thin to ultraheavy") {
        font.weight = Some(weight);
    }
    if let Some(variant) = reader.named("variant", "normal or small-caps") {
        font.variant = Some(variant);
    }
    if let Some(stretch) = reader.named("stretch", "a stretch from ultra-condensed to ultra-expanded") {
        font.stretch = Some(stretch);
    }
}

pub(crate) fn apply_padding(reader: &mut AttrReader<'_>, padding: &mut Padding) {
    if let Some(v) = reader.integer("padleft") {
        padding.left = Some(v);
    }
    if let Some(v) = reader.integer("padright") {
        padding.right = Some(v);
    }
    if let Some(v) = reader.integer("padtop") {
        padding.top = Some(v);
    }
    if let Some(v) = reader.integer("padbottom") {
        padding.bottom = Some(v);
    }
}

/// Spacing and border attributes shared by groups and bands.
pub(crate) fn apply_node_style(reader: &mut AttrReader<'_>, style: &mut NodeStyle) {
    if let Some(v) = reader.integer("pointsabove") {
        style.points_above = v;
    }
    if let Some(v) = reader.integer("pointsbelow") {
        style.points_below = v;
    }
    if let Some(border) = reader.parse_with(
        "outerborder",
        "singlebar, doublebar, singlebarheavy, singlebox or doublebox",
        BorderStyle::from_outer_name,
    ) {
        style.border = style.border | border;
    }
    if let Some(border) =
        reader.parse_with("cellborder", "hline, vbar or boxed", BorderStyle::from_cell_name)
    {
        style.border = style.border | border;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FontStretch, FontWeight};

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn last_duplicate_wins() {
        let a = attrs(&[("size", "8"), ("size", "9")]);
        assert_eq!(a.get("size"), Some("9"));
        assert_eq!(a.get("Size"), None);
    }

    #[test]
    fn font_attributes_parse_their_values() {
        let a = attrs(&[
            ("family", "Times"),
            ("size", "12"),
            ("weight", "bold"),
            ("stretch", "condensed"),
        ]);
        let mut diagnostics = Diagnostics::default();
        let mut font = FontSpec::default();
        apply_font(&mut AttrReader::new("font", &a, &mut diagnostics), &mut font);
        assert_eq!(font.family.as_deref(), Some("Times"));
        assert_eq!(font.size, Some(12.0));
        assert_eq!(font.weight, Some(FontWeight::Bold));
        assert_eq!(font.stretch, Some(FontStretch::Condensed));
        assert!(diagnostics.into_vec().is_empty());
    }

    #[test]
    fn bad_values_leave_field_and_report() {
        let a = attrs(&[("weight", "extrabold"), ("pointsabove", "1.5"), ("color", "red")]);
        let mut diagnostics = Diagnostics::default();
        let mut font = FontSpec::default();
        let mut style = NodeStyle::default();
        let mut reader = AttrReader::new("group", &a, &mut diagnostics);
        apply_font(&mut reader, &mut font);
        apply_node_style(&mut reader, &mut style);
        assert_eq!(font.weight, None);
        assert_eq!(style.points_above, 0.0);
        let found = diagnostics.into_vec();
        assert_eq!(found.len(), 2);
        assert!(found
            .iter()
            .all(|d| matches!(d, Diagnostic::AttributeParse { element, .. } if element == "group")));
    }

    #[test]
    fn nonpositive_size_keeps_inherited_size() {
        for bad in ["0", "-4"] {
            let a = attrs(&[("size", bad)]);
            let mut diagnostics = Diagnostics::default();
            let mut font = FontSpec {
                size: Some(12.0),
                ..Default::default()
            };
            apply_font(&mut AttrReader::new("font", &a, &mut diagnostics), &mut font);
            assert_eq!(font.size, Some(12.0));
            let found = diagnostics.into_vec();
            assert_eq!(found.len(), 1);
            assert!(matches!(
                &found[0],
                Diagnostic::AttributeParse { attribute, .. } if attribute == "size"
            ));
        }
    }

    #[test]
    fn borders_combine() {
        let a = attrs(&[("outerborder", "singlebox"), ("cellborder", "vbar")]);
        let mut diagnostics = Diagnostics::default();
        let mut style = NodeStyle::default();
        apply_node_style(&mut AttrReader::new("body", &a, &mut diagnostics), &mut style);
        assert!(style.border.contains(BorderStyle::SINGLE_BOX));
        assert!(style.border.contains(BorderStyle::VBAR));
    }

    #[test]
    fn negative_padding_accepted() {
        let a = attrs(&[("padtop", "-2"), ("padleft", "4")]);
        let mut diagnostics = Diagnostics::default();
        let mut padding = Padding::default();
        apply_padding(&mut AttrReader::new("padding", &a, &mut diagnostics), &mut padding);
        assert_eq!(padding.top, Some(-2.0));
        assert_eq!(padding.left, Some(4.0));
        assert_eq!(padding.bottom, None);
    }
}
