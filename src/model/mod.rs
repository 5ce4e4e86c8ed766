//! # Report Model
//!
//! The report definition built from layout markup. A report is a tree:
//! nested groups that partition the rows by a column's value, terminating in
//! exactly one body that prints one line per data row. Beside the tree sit
//! two singleton bands, the page header (every page) and the document header
//! (first page only), plus the default cell and default padding that anchor
//! the style cascade.
//!
//! Each band owns an ordered list of [`CellDef`]s. A cell's pixel geometry is
//! derived lazily from its percentage of the page width, once per render.

use std::cell::RefCell;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::data::RowSource;
use crate::error::{Diagnostic, Diagnostics};
use crate::layout::columns::ColumnLayout;
use crate::style::{base_padding, FontDescription, FontSpec, Padding, TextAlign};

/// Edge values (top, right, bottom, left) used for margins and paddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A3,
    A5,
    #[default]
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }

    /// Parse a case-insensitive paper name such as `letter` or `a4`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "a3" => Some(PageSize::A3),
            "a5" => Some(PageSize::A5),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            "tabloid" => Some(PageSize::Tabloid),
            _ => None,
        }
    }
}

/// Paper and margins. The printable area is what the engine lays out into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(36.0)
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::Letter,
            margin: default_margin(),
        }
    }
}

impl PageConfig {
    /// Width of the printable area.
    pub fn content_width(&self) -> f64 {
        (self.size.dimensions().0 - self.margin.horizontal()).max(0.0)
    }

    /// Height of the printable area.
    pub fn content_height(&self) -> f64 {
        (self.size.dimensions().1 - self.margin.vertical()).max(0.0)
    }
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Knobs of the pagination engine that are not part of the layout markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Line heights kept free at the bottom of each page. A row is not
    /// started if it would reach into this margin.
    pub safety_lines: f64,
    /// Digits assumed for the total when sizing "Page N of T" cells.
    pub page_of_placeholder_digits: usize,
    /// strftime-style format of `textsource="now"` cells.
    pub timestamp_format: String,
}

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            safety_lines: 1.0,
            page_of_placeholder_digits: 3,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Everything the host configures for one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub page: PageConfig,
    pub render: RenderOptions,
    pub metadata: Metadata,
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self, crate::error::ReportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Border bitmask shared by groups and bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BorderStyle(u16);

impl BorderStyle {
    pub const NONE: BorderStyle = BorderStyle(0);
    pub const SINGLE_BAR: BorderStyle = BorderStyle(1);
    pub const SINGLE_BAR_HEAVY: BorderStyle = BorderStyle(1 << 1);
    pub const DOUBLE_BAR: BorderStyle = BorderStyle(1 << 2);
    pub const SINGLE_BOX: BorderStyle = BorderStyle(1 << 3);
    pub const DOUBLE_BOX: BorderStyle = BorderStyle(1 << 4);
    pub const HLINE: BorderStyle = BorderStyle(1 << 7);
    pub const VBAR: BorderStyle = BorderStyle(1 << 8);

    pub fn contains(self, other: BorderStyle) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: BorderStyle) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    /// Any of the bar styles drawn above and below a run of rows.
    pub fn has_bars(self) -> bool {
        self.intersects(Self::SINGLE_BAR | Self::SINGLE_BAR_HEAVY | Self::DOUBLE_BAR)
    }

    pub fn has_box(self) -> bool {
        self.intersects(Self::SINGLE_BOX | Self::DOUBLE_BOX)
    }

    /// Value of the `outerborder` attribute.
    pub fn from_outer_name(name: &str) -> Option<Self> {
        match name {
            "singlebar" => Some(Self::SINGLE_BAR),
            "doublebar" => Some(Self::DOUBLE_BAR),
            "singlebarheavy" => Some(Self::SINGLE_BAR_HEAVY),
            "singlebox" => Some(Self::SINGLE_BOX),
            "doublebox" => Some(Self::DOUBLE_BOX),
            _ => None,
        }
    }

    /// Value of the `cellborder` attribute.
    pub fn from_cell_name(name: &str) -> Option<Self> {
        match name {
            "hline" => Some(Self::HLINE),
            "vbar" => Some(Self::VBAR),
            "boxed" => Some(Self::HLINE | Self::VBAR),
            _ => None,
        }
    }
}

impl BitOr for BorderStyle {
    type Output = BorderStyle;

    fn bitor(self, rhs: BorderStyle) -> BorderStyle {
        BorderStyle(self.0 | rhs.0)
    }
}

/// A column named in the markup, with its index once bound to a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: String,
    pub index: Option<usize>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }
}

/// Where a cell's text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSource {
    /// Literal text.
    StaticText(String),
    /// The value of a column in the current row.
    DataColumn(ColumnRef),
    /// "Page N".
    CurrentPageNumber,
    /// "Page N of T".
    PageOfTotalPages,
    /// The render's start time.
    CurrentTime,
    /// A template with `{column}` placeholders filled from the current row.
    FormattedValue(String),
}

/// One positioned, styled piece of text within a row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDef {
    pub source: TextSource,
    /// Share of the page width, in percent.
    pub percent: f64,
    /// Absolute width in points; overrides `percent` when set.
    pub fixed_width: Option<f64>,
    pub align: Option<TextAlign>,
    pub font: FontSpec,
    pub pad_left: Option<f64>,
    pub pad_right: Option<f64>,
}

impl CellDef {
    pub fn new(source: TextSource) -> Self {
        Self {
            source,
            percent: 0.0,
            fixed_width: None,
            align: None,
            font: FontSpec::default(),
            pad_left: None,
            pad_right: None,
        }
    }

    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = percent;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = font;
        self
    }
}

/// Fallbacks for every cell that does not set a field itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultCell {
    pub font: FontSpec,
    pub align: Option<TextAlign>,
    pub pad_left: Option<f64>,
    pub pad_right: Option<f64>,
}

/// Style attributes every node kind carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStyle {
    pub font: FontSpec,
    pub padding: Padding,
    pub border: BorderStyle,
    pub points_above: f64,
    pub points_below: f64,
}

/// A node that prints a row of cells: body, group header, page header or
/// document header.
#[derive(Debug, Clone, Default)]
pub struct RowBand {
    pub style: NodeStyle,
    pub cells: Vec<CellDef>,
    /// Cell geometry, computed on first use for a given page width.
    pub(crate) columns: RefCell<ColumnLayout>,
}

impl RowBand {
    pub fn new(cells: Vec<CellDef>) -> Self {
        Self {
            style: NodeStyle::default(),
            cells,
            columns: RefCell::new(ColumnLayout::default()),
        }
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }
}

/// A node that partitions its row range into runs of equal grouping values.
#[derive(Debug, Clone, Default)]
pub struct GroupNode {
    pub style: NodeStyle,
    pub group_by: Option<ColumnRef>,
    pub header: Option<RowBand>,
    pub child: Option<Content>,
}

impl GroupNode {
    pub fn new(group_by: &str, child: Content) -> Self {
        Self {
            style: NodeStyle::default(),
            group_by: Some(ColumnRef::new(group_by)),
            header: None,
            child: Some(child),
        }
    }

    pub fn with_header(mut self, header: RowBand) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }
}

/// What a group contains, and what the report tree is rooted at.
#[derive(Debug, Clone)]
pub enum Content {
    Group(Box<GroupNode>),
    Body(RowBand),
}

impl Content {
    /// Follow child links down to the body.
    pub fn body(&self) -> Option<&RowBand> {
        match self {
            Content::Body(body) => Some(body),
            Content::Group(group) => group.child.as_ref().and_then(Content::body),
        }
    }

    /// Number of group levels above the body.
    pub fn depth(&self) -> usize {
        match self {
            Content::Body(_) => 0,
            Content::Group(group) => 1 + group.child.as_ref().map_or(0, Content::depth),
        }
    }
}

/// The five kinds of layout node the markup can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Header,
    Body,
    PageHeader,
    DocumentHeader,
}

/// A layout node while it is being built, before it is attached to its parent.
#[derive(Debug, Clone)]
pub enum LayoutNode {
    Group(GroupNode),
    Header(RowBand),
    Body(RowBand),
    PageHeader(RowBand),
    DocumentHeader(RowBand),
}

impl LayoutNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            LayoutNode::Group(_) => NodeKind::Group,
            LayoutNode::Header(_) => NodeKind::Header,
            LayoutNode::Body(_) => NodeKind::Body,
            LayoutNode::PageHeader(_) => NodeKind::PageHeader,
            LayoutNode::DocumentHeader(_) => NodeKind::DocumentHeader,
        }
    }

    pub fn style_mut(&mut self) -> &mut NodeStyle {
        match self {
            LayoutNode::Group(group) => &mut group.style,
            LayoutNode::Header(band)
            | LayoutNode::Body(band)
            | LayoutNode::PageHeader(band)
            | LayoutNode::DocumentHeader(band) => &mut band.style,
        }
    }

    /// The cell list, for every kind except `Group`.
    pub fn cells_mut(&mut self) -> Option<&mut Vec<CellDef>> {
        match self {
            LayoutNode::Group(_) => None,
            LayoutNode::Header(band)
            | LayoutNode::Body(band)
            | LayoutNode::PageHeader(band)
            | LayoutNode::DocumentHeader(band) => Some(&mut band.cells),
        }
    }
}

/// A complete report definition.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub root: Option<Content>,
    pub page_header: Option<RowBand>,
    pub document_header: Option<RowBand>,
    pub default_cell: DefaultCell,
    pub default_padding: Padding,
}

impl Report {
    pub fn new(root: Content) -> Self {
        Self {
            root: Some(root),
            ..Default::default()
        }
    }

    /// The font at the root of the cascade.
    pub fn base_font(&self) -> FontDescription {
        self.default_cell.font.resolve(&FontDescription::default())
    }

    /// The padding at the root of the cascade.
    pub fn base_padding(&self) -> Edges {
        self.default_padding.resolve(&base_padding())
    }

    /// Resolve every named column against `rows`. Each unresolvable name is
    /// reported once.
    pub fn bind(&mut self, rows: &dyn RowSource) -> Vec<Diagnostic> {
        let mut diagnostics = Diagnostics::default();
        if let Some(band) = self.document_header.as_mut() {
            bind_band(band, rows, "document header", &mut diagnostics);
        }
        if let Some(band) = self.page_header.as_mut() {
            bind_band(band, rows, "page header", &mut diagnostics);
        }
        if let Some(root) = self.root.as_mut() {
            bind_content(root, rows, &mut diagnostics);
        }
        diagnostics.into_vec()
    }
}

fn bind_content(content: &mut Content, rows: &dyn RowSource, diagnostics: &mut Diagnostics) {
    match content {
        Content::Body(band) => bind_band(band, rows, "body", diagnostics),
        Content::Group(group) => {
            if let Some(column) = group.group_by.as_mut() {
                column.index = rows.column_index(&column.name);
                if column.index.is_none() {
                    diagnostics.push(Diagnostic::UnknownColumn {
                        column: column.name.clone(),
                        context: "groupsource".to_string(),
                    });
                }
            }
            if let Some(header) = group.header.as_mut() {
                bind_band(header, rows, "group header", diagnostics);
            }
            if let Some(child) = group.child.as_mut() {
                bind_content(child, rows, diagnostics);
            }
        }
    }
}

fn bind_band(band: &mut RowBand, rows: &dyn RowSource, context: &str, diagnostics: &mut Diagnostics) {
    for cell in &mut band.cells {
        match &mut cell.source {
            TextSource::DataColumn(column) => {
                column.index = rows.column_index(&column.name);
                if column.index.is_none() {
                    diagnostics.push(Diagnostic::UnknownColumn {
                        column: column.name.clone(),
                        context: format!("{} cell", context),
                    });
                }
            }
            TextSource::FormattedValue(template) => {
                for name in template_columns(template) {
                    if rows.column_index(name).is_none() {
                        diagnostics.push(Diagnostic::UnknownColumn {
                            column: name.to_string(),
                            context: format!("{} cell template", context),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

/// Column names referenced by `{name}` placeholders in a template.
pub fn template_columns(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        if let Some(stripped) = after.strip_prefix('{') {
            rest = stripped;
            continue;
        }
        match after.find('}') {
            Some(close) => {
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    names
}

/// Fill `{name}` placeholders via `lookup`. `{{` and `}}` are literal braces;
/// placeholders whose lookup fails expand to nothing.
pub fn expand_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                match template[i + 1..].find('}') {
                    Some(len) => {
                        let name = &template[i + 1..i + 1 + len];
                        if let Some(value) = lookup(name) {
                            out.push_str(value);
                        }
                        // Consume through the closing brace.
                        while let Some((j, _)) = chars.peek() {
                            if *j > i + 1 + len {
                                break;
                            }
                            chars.next();
                        }
                    }
                    None => out.push('{'),
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(ch),
        }
    }
    out
}
