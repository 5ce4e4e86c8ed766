//! # tableprint CLI
//!
//! Usage:
//!   tableprint layout.xml --data rows.json -o report.pdf
//!   tableprint layout.xml --data rows.json --config report.json
//!   tableprint --example > layout.xml

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tableprint::model::{Edges, PageSize, ReportConfig};
use tableprint::{ReportError, RowSet};

#[derive(Parser, Debug)]
#[command(version, about = "Render grouped table reports to PDF")]
struct Args {
    /// Layout markup document
    #[arg(required_unless_present = "example")]
    layout: Option<PathBuf>,

    /// Rows as a JSON array of flat objects
    #[arg(short, long, required_unless_present = "example")]
    data: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "report.pdf")]
    output: PathBuf,

    /// JSON file with page, render and metadata settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paper name (letter, legal, tabloid, a3, a4, a5)
    #[arg(long, value_parser = parse_page_size)]
    page_size: Option<PageSize>,

    /// Margin on every edge, in points
    #[arg(long)]
    margin: Option<f64>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// More logging; repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print an example layout and exit
    #[arg(long)]
    example: bool,
}

fn parse_page_size(name: &str) -> Result<PageSize, String> {
    PageSize::from_name(name).ok_or_else(|| format!("unknown page size '{}'", name))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.example {
        print!("{}", EXAMPLE_LAYOUT);
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ReportError> {
    let (Some(layout_path), Some(data_path)) = (&args.layout, &args.data) else {
        return Err(ReportError::InvalidData(
            "a layout and a data file are required".to_string(),
        ));
    };

    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
            ReportConfig::from_json(&json)?
        }
        None => ReportConfig::default(),
    };
    if let Some(size) = args.page_size {
        config.page.size = size;
    }
    if let Some(margin) = args.margin {
        config.page.margin = Edges::uniform(margin);
    }
    if let Some(title) = &args.title {
        config.metadata.title = Some(title.clone());
    }

    let rows = RowSet::from_json_file(data_path)?;
    let layout = fs::read_to_string(layout_path).map_err(|e| ReportError::io(layout_path, e))?;
    let output = tableprint::render_pdf(&layout, &rows, &config)?;

    for diagnostic in &output.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    fs::write(&args.output, &output.pdf).map_err(|e| ReportError::io(&args.output, e))?;
    eprintln!(
        "✓ Written {} pages ({} bytes) to {}",
        output.page_count,
        output.pdf.len(),
        args.output.display()
    );
    Ok(())
}

const EXAMPLE_LAYOUT: &str = r#"<?xml version="1.0"?>
<report>
  <defaultcell align="l"><font family="Sans" size="9"/></defaultcell>
  <docheader pointsbelow="6">
    <font size="14" weight="bold"/>
    <cell celltext="Sales by Region" percent="70"/>
    <cell textsource="now" percent="30" align="r"/>
  </docheader>
  <pageheader outerborder="singlebar" pointsbelow="4">
    <cell celltext="Region / Rep" percent="50"/>
    <cell celltext="Amount" percent="25" align="r"/>
    <cell textsource="pageof" percent="25" align="r"/>
  </pageheader>
  <group groupsource="region" pointsabove="8" outerborder="singlebarheavy">
    <header>
      <font weight="bold"/>
      <cell textsource="data" celltext="region" percent="100"/>
    </header>
    <body cellborder="hline">
      <cell textsource="data" celltext="rep" percent="50"/>
      <cell textsource="printf" celltext="${amount}" percent="25" align="r"/>
    </body>
  </group>
</report>
"#;
