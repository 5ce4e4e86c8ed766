//! # Report Tree Builder
//!
//! Turns a stream of open/close element events into a [`Report`]. The
//! builder keeps its own stack of open elements; each node is owned by the
//! stack while open and is moved into its parent when it closes, so the
//! finished tree is plain owned data.
//!
//! Elements that cannot be attached where they appear are skipped together
//! with everything inside them, and reported as `MarkupStructure`
//! diagnostics. Unknown elements are transparent.

pub mod attrs;

pub use attrs::Attributes;

use crate::data::RowSource;
use crate::error::{Diagnostic, Diagnostics};
use crate::model::{
    CellDef, ColumnRef, Content, DefaultCell, GroupNode, LayoutNode, NodeKind, Report, RowBand,
    TextSource,
};
use crate::style::{Padding, TextAlign};

use attrs::{apply_font, apply_node_style, apply_padding, AttrReader};

/// One markup event.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Open { name: String, attributes: Attributes },
    Close { name: String },
}

impl MarkupEvent {
    pub fn open<K, V>(name: &str, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MarkupEvent::Open {
            name: name.to_string(),
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn close(name: &str) -> Self {
        MarkupEvent::Close {
            name: name.to_string(),
        }
    }
}

/// An element on the open stack.
#[derive(Debug)]
enum Open {
    Node(LayoutNode),
    Cell(CellDef),
    DefaultCell,
    /// `font`, `padding` and `defaultpadding` take effect on open.
    Setting(String),
    /// An unknown element. Invisible when looking for a parent.
    Passthrough(String),
    /// A skipped element or anything nested inside one.
    Skipped(String),
}

impl Open {
    fn name(&self) -> &str {
        match self {
            Open::Node(node) => match node.kind() {
                NodeKind::Group => "group",
                NodeKind::Header => "header",
                NodeKind::Body => "body",
                NodeKind::PageHeader => "pageheader",
                NodeKind::DocumentHeader => "docheader",
            },
            Open::Cell(_) => "cell",
            Open::DefaultCell => "defaultcell",
            Open::Setting(name) | Open::Passthrough(name) | Open::Skipped(name) => name,
        }
    }
}

/// Builds a [`Report`] from markup events.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    stack: Vec<Open>,
    root: Option<Content>,
    page_header: Option<RowBand>,
    document_header: Option<RowBand>,
    default_cell: DefaultCell,
    default_padding: Padding,
    diagnostics: Diagnostics,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&mut self, event: MarkupEvent) {
        match event {
            MarkupEvent::Open { name, attributes } => self.open(&name, &attributes),
            MarkupEvent::Close { name } => self.close(&name),
        }
    }

    /// Handle an opening element.
    pub fn open(&mut self, name: &str, attributes: &Attributes) {
        if matches!(self.stack.last(), Some(Open::Skipped(_))) {
            self.stack.push(Open::Skipped(name.to_string()));
            return;
        }

        let entry = match name {
            "group" | "body" => self.open_content(name, attributes),
            "header" => self.open_header(attributes),
            "pageheader" | "docheader" => Ok(self.open_singleton(name, attributes)),
            "cell" => self.open_cell(attributes),
            "defaultcell" => {
                self.apply_default_cell(attributes);
                Ok(Open::DefaultCell)
            }
            "font" => self.apply_font(attributes),
            "padding" => self.apply_padding(attributes),
            "defaultpadding" => {
                let mut reader = AttrReader::new(name, attributes, &mut self.diagnostics);
                apply_padding(&mut reader, &mut self.default_padding);
                Ok(Open::Setting(name.to_string()))
            }
            _ => {
                log::debug!("passing through unknown element <{}>", name);
                Ok(Open::Passthrough(name.to_string()))
            }
        };

        match entry {
            Ok(entry) => self.stack.push(entry),
            Err(reason) => {
                self.diagnostics.push(Diagnostic::MarkupStructure {
                    element: name.to_string(),
                    reason: reason.to_string(),
                });
                self.stack.push(Open::Skipped(name.to_string()));
            }
        }
    }

    /// Handle a closing element. The innermost open element is closed and
    /// attached to its parent.
    pub fn close(&mut self, name: &str) {
        let Some(entry) = self.stack.pop() else {
            self.diagnostics.push(Diagnostic::MarkupStructure {
                element: name.to_string(),
                reason: "closed without being opened".to_string(),
            });
            return;
        };
        if entry.name() != name {
            log::warn!("</{}> closes <{}>", name, entry.name());
        }

        match entry {
            Open::Node(node) => self.attach(node),
            Open::Cell(cell) => match self.parent_mut() {
                Some(Open::Node(parent)) => {
                    if let Some(cells) = parent.cells_mut() {
                        cells.push(cell);
                    }
                }
                _ => log::debug!("cell lost its parent"),
            },
            Open::DefaultCell | Open::Setting(_) | Open::Passthrough(_) | Open::Skipped(_) => {}
        }
    }

    /// Record a problem found while reading the markup itself.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Close anything still open and return the report with every
    /// diagnostic collected so far.
    pub fn finish(mut self) -> (Report, Vec<Diagnostic>) {
        while let Some(entry) = self.stack.last() {
            let name = entry.name().to_string();
            if !matches!(entry, Open::Passthrough(_) | Open::Skipped(_)) {
                self.diagnostics.push(Diagnostic::MarkupStructure {
                    element: name.clone(),
                    reason: "never closed".to_string(),
                });
            }
            self.close(&name);
        }

        let report = Report {
            root: self.root,
            page_header: self.page_header,
            document_header: self.document_header,
            default_cell: self.default_cell,
            default_padding: self.default_padding,
        };
        (report, self.diagnostics.into_vec())
    }

    /// Innermost open element that is not a passthrough.
    fn parent_mut(&mut self) -> Option<&mut Open> {
        self.stack
            .iter_mut()
            .rev()
            .find(|entry| !matches!(entry, Open::Passthrough(_)))
    }

    fn open_content(&mut self, name: &str, attributes: &Attributes) -> Result<Open, &'static str> {
        let has_root = self.root.is_some();
        match self.parent_mut() {
            None if has_root => return Err("the report already has a root group or body"),
            None => {}
            Some(Open::Node(LayoutNode::Group(group))) => {
                if group.child.is_some() {
                    return Err("the enclosing group already has a group or body");
                }
            }
            Some(_) => return Err("must be the root or nested directly in a group"),
        }

        let mut reader = AttrReader::new(name, attributes, &mut self.diagnostics);
        if name == "group" {
            let mut group = GroupNode::default();
            apply_node_style(&mut reader, &mut group.style);
            group.group_by = reader
                .text("groupsource")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ColumnRef::new);
            if group.group_by.is_none() {
                log::debug!("<group> without groupsource treats its rows as one run");
            }
            Ok(Open::Node(LayoutNode::Group(group)))
        } else {
            let mut body = RowBand::default();
            apply_node_style(&mut reader, &mut body.style);
            Ok(Open::Node(LayoutNode::Body(body)))
        }
    }

    fn open_header(&mut self, attributes: &Attributes) -> Result<Open, &'static str> {
        let has_header = match self.parent_mut() {
            Some(Open::Node(LayoutNode::Group(group))) => group.header.is_some(),
            _ => return Err("must be nested directly in a group"),
        };
        if has_header {
            return Err("the enclosing group already has a header");
        }
        let mut header = RowBand::default();
        let mut reader = AttrReader::new("header", attributes, &mut self.diagnostics);
        apply_node_style(&mut reader, &mut header.style);
        Ok(Open::Node(LayoutNode::Header(header)))
    }

    /// Page and document headers are singletons: opening one again reopens
    /// it, so later cells append to it.
    fn open_singleton(&mut self, name: &str, attributes: &Attributes) -> Open {
        let existing = if name == "pageheader" {
            self.page_header.take()
        } else {
            self.document_header.take()
        };
        let mut band = existing.unwrap_or_default();
        let mut reader = AttrReader::new(name, attributes, &mut self.diagnostics);
        apply_node_style(&mut reader, &mut band.style);
        if name == "pageheader" {
            Open::Node(LayoutNode::PageHeader(band))
        } else {
            Open::Node(LayoutNode::DocumentHeader(band))
        }
    }

    fn open_cell(&mut self, attributes: &Attributes) -> Result<Open, &'static str> {
        match self.parent_mut() {
            Some(Open::Node(node)) if node.kind() != NodeKind::Group => {}
            _ => return Err("must be nested in a body or header"),
        }

        let mut reader = AttrReader::new("cell", attributes, &mut self.diagnostics);
        let text = reader.text("celltext").unwrap_or_default().to_string();
        let kind = reader
            .parse_with(
                "textsource",
                "data, static, now, printf, pageof or page",
                SourceKind::parse,
            )
            .unwrap_or(SourceKind::Static);
        let source = match kind {
            SourceKind::Data => TextSource::DataColumn(ColumnRef::new(text.trim())),
            SourceKind::Static => TextSource::StaticText(text),
            SourceKind::Now => TextSource::CurrentTime,
            SourceKind::Printf => TextSource::FormattedValue(text),
            SourceKind::PageOf => TextSource::PageOfTotalPages,
            SourceKind::Page => TextSource::CurrentPageNumber,
        };

        let mut cell = CellDef::new(source);
        if let Some(percent) = reader.number("percent") {
            cell.percent = percent;
        }
        cell.fixed_width = reader.number("cellwidth");
        cell.align = reader.named::<TextAlign>("align", "l, c or r");
        cell.pad_left = reader.integer("padleft");
        cell.pad_right = reader.integer("padright");
        Ok(Open::Cell(cell))
    }

    fn apply_default_cell(&mut self, attributes: &Attributes) {
        let mut reader = AttrReader::new("defaultcell", attributes, &mut self.diagnostics);
        if let Some(align) = reader.named::<TextAlign>("align", "l, c or r") {
            self.default_cell.align = Some(align);
        }
        if let Some(v) = reader.integer("padleft") {
            self.default_cell.pad_left = Some(v);
        }
        if let Some(v) = reader.integer("padright") {
            self.default_cell.pad_right = Some(v);
        }
    }

    fn apply_font(&mut self, attributes: &Attributes) -> Result<Open, &'static str> {
        let Self {
            stack,
            default_cell,
            diagnostics,
            ..
        } = self;
        let mut reader = AttrReader::new("font", attributes, diagnostics);
        match stack.iter_mut().rev().find(|e| !matches!(e, Open::Passthrough(_))) {
            Some(Open::Node(node)) => apply_font(&mut reader, &mut node.style_mut().font),
            Some(Open::Cell(cell)) => apply_font(&mut reader, &mut cell.font),
            Some(Open::DefaultCell) => apply_font(&mut reader, &mut default_cell.font),
            _ => return Err("must be nested in a group, band, cell or defaultcell"),
        }
        Ok(Open::Setting("font".to_string()))
    }

    fn apply_padding(&mut self, attributes: &Attributes) -> Result<Open, &'static str> {
        let Self {
            stack,
            default_cell,
            diagnostics,
            ..
        } = self;
        let mut reader = AttrReader::new("padding", attributes, diagnostics);
        match stack.iter_mut().rev().find(|e| !matches!(e, Open::Passthrough(_))) {
            Some(Open::Node(node)) => apply_padding(&mut reader, &mut node.style_mut().padding),
            Some(Open::Cell(cell)) => {
                let mut padding = Padding {
                    left: cell.pad_left,
                    right: cell.pad_right,
                    ..Default::default()
                };
                apply_padding(&mut reader, &mut padding);
                cell.pad_left = padding.left;
                cell.pad_right = padding.right;
            }
            Some(Open::DefaultCell) => {
                let mut padding = Padding {
                    left: default_cell.pad_left,
                    right: default_cell.pad_right,
                    ..Default::default()
                };
                apply_padding(&mut reader, &mut padding);
                default_cell.pad_left = padding.left;
                default_cell.pad_right = padding.right;
            }
            _ => return Err("must be nested in a group, band, cell or defaultcell"),
        }
        Ok(Open::Setting("padding".to_string()))
    }

    /// Move a closed node into its parent.
    fn attach(&mut self, node: LayoutNode) {
        match node {
            LayoutNode::Group(group) => {
                if group.child.is_none() {
                    self.diagnostics.push(Diagnostic::MarkupStructure {
                        element: "group".to_string(),
                        reason: "contains no group or body".to_string(),
                    });
                }
                self.attach_content(Content::Group(Box::new(group)));
            }
            LayoutNode::Body(body) => self.attach_content(Content::Body(body)),
            LayoutNode::Header(header) => {
                if let Some(Open::Node(LayoutNode::Group(group))) = self.parent_mut() {
                    group.header = Some(header);
                }
            }
            LayoutNode::PageHeader(band) => self.page_header = Some(band),
            LayoutNode::DocumentHeader(band) => self.document_header = Some(band),
        }
    }

    fn attach_content(&mut self, content: Content) {
        match self.parent_mut() {
            Some(Open::Node(LayoutNode::Group(group))) => group.child = Some(content),
            _ => self.root = Some(content),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Data,
    Static,
    Now,
    Printf,
    PageOf,
    Page,
}

impl SourceKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "data" => Some(SourceKind::Data),
            "static" => Some(SourceKind::Static),
            "now" => Some(SourceKind::Now),
            "printf" => Some(SourceKind::Printf),
            "pageof" => Some(SourceKind::PageOf),
            "page" => Some(SourceKind::Page),
            _ => None,
        }
    }
}

/// Build a report from markup events and bind its column names against
/// `rows`. Every recoverable problem is returned as a diagnostic.
pub fn build_report<I>(events: I, rows: &dyn RowSource) -> (Report, Vec<Diagnostic>)
where
    I: IntoIterator<Item = MarkupEvent>,
{
    let mut builder = ReportBuilder::new();
    for event in events {
        builder.event(event);
    }
    let (mut report, mut diagnostics) = builder.finish();
    diagnostics.extend(report.bind(rows));
    (report, diagnostics)
}
