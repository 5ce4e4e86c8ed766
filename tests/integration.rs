//! Integration tests for the tableprint pipeline.
//!
//! These tests run layout markup through the builder and both pagination
//! passes onto a surface with fixed metrics, so every page break can be
//! worked out by hand. They verify:
//! - Grouping follows value transitions in row order
//! - Page breaks land where the measured heights say they must
//! - A group resumed on a new page does not repeat its header
//! - Both passes see the same cells, text, fonts and geometry
//! - The PDF pipeline produces a structurally valid file

use tableprint::data::{RowSet, RowSource};
use tableprint::error::{Diagnostic, DiagnosticKind};
use tableprint::layout::Paginator;
use tableprint::markup::build_from_str;
use tableprint::model::{Content, RenderOptions, Report, ReportConfig};
use tableprint::style::{FontDescription, TextAlign};
use tableprint::surface::{CellEvent, Pass, Surface};

// ─── Helpers ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Seen {
    pass: Pass,
    page: usize,
    row: Option<usize>,
    cell: usize,
    text: String,
    family: String,
    size: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Seen {
    fn geometry(&self) -> (usize, Option<usize>, usize, f64, f64, f64, f64) {
        (self.page, self.row, self.cell, self.x, self.y, self.width, self.height)
    }
}

/// Every line is `size + 2` points tall and text never wraps, so heights
/// are exact.
struct FixedSurface {
    width: f64,
    height: f64,
    cells: Vec<Seen>,
    begun: Vec<usize>,
    lines: usize,
    rects: usize,
}

impl FixedSurface {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            cells: Vec::new(),
            begun: Vec::new(),
            lines: 0,
            rects: 0,
        }
    }

    fn painted(&self) -> Vec<&Seen> {
        self.cells.iter().filter(|c| c.pass == Pass::Paint).collect()
    }

    fn measured(&self) -> Vec<&Seen> {
        self.cells.iter().filter(|c| c.pass == Pass::Measure).collect()
    }

    fn painted_on(&self, page: usize) -> Vec<&Seen> {
        self.painted().into_iter().filter(|c| c.page == page).collect()
    }
}

impl Surface for FixedSurface {
    fn page_width(&self) -> f64 {
        self.width
    }

    fn page_height(&self) -> f64 {
        self.height
    }

    fn measure(&self, text: &str, font: &FontDescription, _max_width: f64) -> f64 {
        text.split('\n').count() as f64 * (font.size + 2.0)
    }

    fn draw_text(&mut self, _: &str, _: &FontDescription, _: f64, _: f64, _: f64, _: TextAlign) {}

    fn draw_line(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64) {
        self.lines += 1;
    }

    fn draw_rect(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64) {
        self.rects += 1;
    }

    fn begin_page(&mut self, page: usize) {
        self.begun.push(page);
    }

    fn on_cell(&mut self, event: &CellEvent<'_>) {
        self.cells.push(Seen {
            pass: event.pass,
            page: event.page,
            row: event.row,
            cell: event.cell,
            text: event.text.to_string(),
            family: event.font.family.clone(),
            size: event.font.size,
            x: event.x,
            y: event.y,
            width: event.width,
            height: event.height,
        });
    }
}

fn keyed_rows(keys: &[&str]) -> RowSet {
    RowSet::from_records(
        keys.iter()
            .enumerate()
            .map(|(i, key)| vec![("key", key.to_string()), ("val", format!("v{}", i))]),
    )
}

const GROUPED: &str = r#"
<report>
  <group groupsource="key">
    <header><cell textsource="printf" celltext="Group {key}" percent="100"/></header>
    <body><cell textsource="data" celltext="val" percent="100"/></body>
  </group>
</report>"#;

fn build(xml: &str, rows: &RowSet) -> (Report, Vec<Diagnostic>) {
    build_from_str(xml, rows).expect("layout should be well-formed")
}

fn run(report: &Report, rows: &RowSet, surface: &mut FixedSurface) -> usize {
    let options = RenderOptions::default();
    Paginator::new(report, rows, &options)
        .with_timestamp("2024-01-01 00:00")
        .run(surface)
}

fn headers<'a>(cells: &[&'a Seen]) -> Vec<&'a str> {
    cells
        .iter()
        .filter(|c| c.text.starts_with("Group "))
        .map(|c| c.text.as_str())
        .collect()
}

// ─── Grouping ───────────────────────────────────────────────────

#[test]
fn groups_follow_value_transitions() {
    let rows = keyed_rows(&["A", "A", "B", "B", "B", "C"]);
    let (report, diagnostics) = build(GROUPED, &rows);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let mut surface = FixedSurface::new(500.0, 700.0);
    assert_eq!(run(&report, &rows, &mut surface), 1);

    let painted = surface.painted();
    assert_eq!(headers(&painted), ["Group A", "Group B", "Group C"]);
    let body_rows: Vec<Option<usize>> = painted
        .iter()
        .filter(|c| c.text.starts_with('v'))
        .map(|c| c.row)
        .collect();
    assert_eq!(body_rows, (0..6).map(Some).collect::<Vec<_>>());
}

#[test]
fn header_resolves_against_first_row_of_run() {
    let rows = keyed_rows(&["A", "B", "B"]);
    let (report, _) = build(GROUPED, &rows);
    let mut surface = FixedSurface::new(500.0, 700.0);
    run(&report, &rows, &mut surface);

    let header_rows: Vec<Option<usize>> = surface
        .painted()
        .iter()
        .filter(|c| c.text.starts_with("Group "))
        .map(|c| c.row)
        .collect();
    assert_eq!(header_rows, [Some(0), Some(1)]);
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn break_mid_group_resumes_without_header() {
    let rows = keyed_rows(&["A"; 10]);
    let (report, _) = build(GROUPED, &rows);
    // Lines are 12pt; one line of safety leaves 48pt: a header and three
    // rows on the first page, four rows after that.
    let mut surface = FixedSurface::new(500.0, 60.0);
    let options = RenderOptions::default();
    let paginator = Paginator::new(&report, &rows, &options);
    let breaks = paginator.measure(&mut surface);
    assert_eq!(breaks.page_ends, [3, 7, 10]);

    paginator.paint(&breaks, &mut surface);
    assert_eq!(surface.begun, [0, 1, 2]);
    assert_eq!(headers(&surface.painted_on(0)), ["Group A"]);
    for page in 1..3 {
        let cells = surface.painted_on(page);
        assert!(headers(&cells).is_empty(), "page {} repeats the header", page);
        assert_eq!(cells[0].row, Some(breaks.start_of(page)));
        assert_eq!(cells[0].y, 0.0);
    }
}

#[test]
fn header_kept_with_first_row() {
    let rows = keyed_rows(&["A", "A", "A", "B", "B", "B"]);
    let (report, _) = build(GROUPED, &rows);
    // 60pt usable: group A fills 48pt. Header B alone would fit, but not
    // together with its first row.
    let mut surface = FixedSurface::new(500.0, 72.0);
    let options = RenderOptions::default();
    let breaks = Paginator::new(&report, &rows, &options).measure(&mut surface);
    assert_eq!(breaks.page_ends, [3, 6]);

    let mut surface = FixedSurface::new(500.0, 72.0);
    run(&report, &rows, &mut surface);
    let second = surface.painted_on(1);
    assert_eq!(second[0].text, "Group B");
    assert_eq!(second[0].y, 0.0);
}

#[test]
fn oversized_row_still_progresses() {
    let tall = "a\nb\nc\nd\ne\nf\ng\nh";
    let rows = RowSet::from_records(vec![vec![("val", tall)], vec![("val", tall)]]);
    let xml = r#"<body><cell textsource="data" celltext="val" percent="100"/></body>"#;
    let (report, _) = build(xml, &rows);
    let mut surface = FixedSurface::new(500.0, 60.0);
    let options = RenderOptions::default();
    let breaks = Paginator::new(&report, &rows, &options).measure(&mut surface);
    assert_eq!(breaks.page_ends, [1, 2]);
}

#[test]
fn empty_dataset_renders_one_page() {
    let rows = RowSet::new(vec!["key".to_string(), "val".to_string()]);
    let xml = r#"
        <report>
          <pageheader><cell textsource="pageof" percent="100"/></pageheader>
          <group groupsource="key">
            <header><cell celltext="never" percent="100"/></header>
            <body><cell textsource="data" celltext="val" percent="100"/></body>
          </group>
        </report>"#;
    let (report, diagnostics) = build(xml, &rows);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let mut surface = FixedSurface::new(500.0, 700.0);
    assert_eq!(run(&report, &rows, &mut surface), 1);
    assert_eq!(surface.begun, [0]);
    let painted = surface.painted();
    assert_eq!(painted.len(), 1);
    assert_eq!(painted[0].text, "Page 1 of 1");
    assert_eq!(painted[0].row, None);
}

#[test]
fn measuring_twice_gives_same_breaks() {
    let rows = keyed_rows(&["A", "A", "B", "C", "C", "C", "C", "D", "E", "E"]);
    let (report, _) = build(GROUPED, &rows);
    let options = RenderOptions::default();
    let paginator = Paginator::new(&report, &rows, &options);
    let first = paginator.measure(&mut FixedSurface::new(500.0, 60.0));
    let second = paginator.measure(&mut FixedSurface::new(500.0, 60.0));
    assert_eq!(first, second);
    assert_eq!(*first.page_ends.last().unwrap(), rows.row_count());
}

#[test]
fn passes_see_identical_geometry() {
    let rows = keyed_rows(&["A", "A", "B", "B", "B", "C", "C", "D"]);
    let xml = r#"
        <report>
          <docheader pointsbelow="4"><cell celltext="Title" percent="100"/></docheader>
          <pageheader><cell textsource="page" percent="100"/></pageheader>
          <group groupsource="key" pointsabove="3" outerborder="doublebar">
            <header><cell textsource="data" celltext="key" percent="30"/></header>
            <body cellborder="hline">
              <cell textsource="data" celltext="val" percent="40"/>
              <cell textsource="printf" celltext="[{val}]" percent="60"/>
            </body>
          </group>
        </report>"#;
    let (report, _) = build(xml, &rows);
    let mut surface = FixedSurface::new(400.0, 90.0);
    let pages = run(&report, &rows, &mut surface);
    assert!(pages > 1);

    let measured: Vec<_> = surface.measured().iter().map(|c| c.geometry()).collect();
    let painted: Vec<_> = surface.painted().iter().map(|c| c.geometry()).collect();
    assert_eq!(measured, painted);
    let content = |c: &&Seen| (c.text.clone(), c.family.clone(), c.size);
    let measured_content: Vec<_> = surface.measured().iter().map(content).collect();
    let painted_content: Vec<_> = surface.painted().iter().map(content).collect();
    assert_eq!(measured_content, painted_content);
}

#[test]
fn page_of_total_uses_final_count() {
    let rows = keyed_rows(&["A"; 10]);
    let xml = r#"
        <report>
          <pageheader><cell textsource="pageof" percent="100"/></pageheader>
          <body><cell textsource="data" celltext="val" percent="100"/></body>
        </report>"#;
    let (report, _) = build(xml, &rows);
    let mut surface = FixedSurface::new(500.0, 60.0);
    let pages = run(&report, &rows, &mut surface);
    assert_eq!(pages, 4);

    let footers: Vec<&str> = surface
        .painted()
        .iter()
        .filter(|c| c.text.starts_with("Page "))
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(footers, ["Page 1 of 4", "Page 2 of 4", "Page 3 of 4", "Page 4 of 4"]);
    assert!(surface
        .measured()
        .iter()
        .filter(|c| c.text.starts_with("Page "))
        .all(|c| c.text.ends_with("of 999")));
}

// ─── Styles and columns ─────────────────────────────────────────

#[test]
fn font_cascades_from_default_cell() {
    let rows = keyed_rows(&["A", "A"]);
    let xml = r#"
        <report>
          <defaultcell><font family="Times" size="12"/></defaultcell>
          <group groupsource="key">
            <header><cell textsource="printf" celltext="Group {key}" percent="100"/></header>
            <body>
              <font size="8"/>
              <cell textsource="data" celltext="val" percent="50"/>
              <cell celltext="bold" percent="50"><font weight="bold"/></cell>
            </body>
          </group>
        </report>"#;
    let (report, diagnostics) = build(xml, &rows);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    let mut surface = FixedSurface::new(500.0, 700.0);
    run(&report, &rows, &mut surface);

    let painted = surface.painted();
    let header = painted.iter().find(|c| c.text == "Group A").unwrap();
    assert_eq!((header.family.as_str(), header.size), ("Times", 12.0));
    let value = painted.iter().find(|c| c.text == "v0").unwrap();
    assert_eq!((value.family.as_str(), value.size), ("Times", 8.0));
    assert_eq!(value.height, 10.0);
    let bold = painted.iter().find(|c| c.text == "bold").unwrap();
    assert_eq!(bold.size, 8.0);
}

#[test]
fn cell_padding_narrows_text_box() {
    let rows = keyed_rows(&["A"]);
    let xml = r#"
        <report>
          <body>
            <cell textsource="data" celltext="key" percent="50"/>
            <cell textsource="data" celltext="val" percent="50" padleft="4" padright="0"/>
          </body>
        </report>"#;
    let (report, _) = build(xml, &rows);
    let mut surface = FixedSurface::new(400.0, 700.0);
    run(&report, &rows, &mut surface);

    let painted = surface.painted();
    assert_eq!((painted[0].x, painted[0].width), (10.0, 180.0));
    assert_eq!((painted[1].x, painted[1].width), (204.0, 196.0));
}

#[test]
fn column_widths_fill_page() {
    let rows = keyed_rows(&["A"]);
    let xml = r#"
        <body>
          <cell celltext="a" percent="25"/>
          <cell celltext="b" percent="25"/>
          <cell celltext="c" percent="50"/>
        </body>"#;
    let (report, _) = build(xml, &rows);
    let body = report.root.as_ref().and_then(Content::body).unwrap();
    let columns = body.columns(468.0);
    let total: f64 = columns.slots.iter().map(|s| s.width).sum();
    assert!((total - 468.0).abs() < 1e-9);
    assert_eq!(columns.slots[2].x, 234.0);
}

// ─── Diagnostics ────────────────────────────────────────────────

#[test]
fn unknown_column_reported_once_and_blank() {
    let rows = keyed_rows(&["A", "B", "C"]);
    let xml = r#"
        <body>
          <cell textsource="data" celltext="nope" percent="50"/>
          <cell textsource="data" celltext="val" percent="50"/>
        </body>"#;
    let (report, diagnostics) = build(xml, &rows);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind(), DiagnosticKind::UnknownColumn);

    let mut surface = FixedSurface::new(500.0, 700.0);
    run(&report, &rows, &mut surface);
    let painted = surface.painted();
    assert_eq!(painted.len(), 3);
    assert!(painted.iter().all(|c| c.cell == 1));
}

#[test]
fn misplaced_elements_do_not_stop_rendering() {
    let rows = keyed_rows(&["A", "B"]);
    let xml = r#"
        <report>
          <header><cell celltext="orphan" percent="100"/></header>
          <body><cell textsource="data" celltext="key" percent="100" align="middle"/></body>
        </report>"#;
    let (report, diagnostics) = build(xml, &rows);
    let kinds: Vec<DiagnosticKind> = diagnostics.iter().map(Diagnostic::kind).collect();
    assert_eq!(
        kinds,
        [DiagnosticKind::MarkupStructure, DiagnosticKind::AttributeParse]
    );

    let mut surface = FixedSurface::new(500.0, 700.0);
    run(&report, &rows, &mut surface);
    let texts: Vec<&str> = surface.painted().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["A", "B"]);
}

// ─── Borders ────────────────────────────────────────────────────

#[test]
fn hline_and_box_rules_are_painted() {
    let rows = keyed_rows(&["A", "A"]);
    let xml = r#"
        <body outerborder="singlebox" cellborder="hline">
          <cell textsource="data" celltext="val" percent="100"/>
        </body>"#;
    let (report, _) = build(xml, &rows);
    let mut surface = FixedSurface::new(500.0, 700.0);
    run(&report, &rows, &mut surface);
    // One rule above the first row and one under each row.
    assert_eq!(surface.lines, 3);
    assert_eq!(surface.rects, 1);
}

// ─── PDF pipeline ───────────────────────────────────────────────

#[test]
fn render_pdf_end_to_end() {
    let rows = RowSet::from_json(
        r#"[
            {"key": "North", "val": "Ann", "amount": 12},
            {"key": "North", "val": "Bo", "amount": 7.5},
            {"key": "South", "val": "Cy", "amount": null}
        ]"#,
    )
    .unwrap();
    let mut config = ReportConfig::default();
    config.metadata.title = Some("Regions".to_string());

    let output = tableprint::render_pdf(GROUPED, &rows, &config).unwrap();
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.page_count, 1);
    assert!(output.pdf.starts_with(b"%PDF-1.7"));
    let text = String::from_utf8_lossy(&output.pdf);
    assert!(text.contains("/Title (Regions)"));
    assert!(text.contains("/BaseFont /Times-Roman"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn recorded_pages_carry_text() {
    let rows = keyed_rows(&["A", "B"]);
    let (report, _) = build(GROUPED, &rows);
    let pages = tableprint::render_pages(&report, &rows, &ReportConfig::default());
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].text_lines(), ["Group A", "v0", "Group B", "v1"]);
}

#[test]
fn malformed_layout_is_fatal() {
    let rows = keyed_rows(&["A"]);
    let result = tableprint::render_pdf("<group><body></group>", &rows, &ReportConfig::default());
    assert!(matches!(result, Err(tableprint::ReportError::Markup(_))));
}
