//! A [`Surface`] that measures with the standard font metrics and records
//! each painted page as a list of draw commands, ready for the PDF writer.

use crate::font::{FontContext, StandardFont};
use crate::model::PageConfig;
use crate::style::{FontDescription, TextAlign};
use crate::text::TextLayout;

use super::Surface;

/// One line of a text command, already offset for alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    pub text: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        lines: Vec<PositionedLine>,
        font: FontDescription,
        face: StandardFont,
        line_height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedPage {
    pub commands: Vec<DrawCommand>,
}

impl RecordedPage {
    /// All text on the page, line by line, in drawing order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { lines, .. } => Some(lines),
                _ => None,
            })
            .flatten()
            .map(|line| line.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PageRecorder {
    config: PageConfig,
    fonts: FontContext,
    layout: TextLayout,
    pages: Vec<RecordedPage>,
    current: Option<RecordedPage>,
}

impl PageRecorder {
    pub fn new(config: PageConfig) -> Self {
        Self::with_fonts(config, FontContext::new())
    }

    pub fn with_fonts(config: PageConfig, fonts: FontContext) -> Self {
        Self {
            config,
            fonts,
            layout: TextLayout::new(),
            pages: Vec::new(),
            current: None,
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn into_pages(mut self) -> Vec<RecordedPage> {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        self.pages
    }

    fn push(&mut self, command: DrawCommand) {
        match self.current.as_mut() {
            Some(page) => page.commands.push(command),
            None => log::debug!("draw call outside a page dropped"),
        }
    }
}

impl Surface for PageRecorder {
    fn page_width(&self) -> f64 {
        self.config.content_width()
    }

    fn page_height(&self) -> f64 {
        self.config.content_height()
    }

    fn measure(&self, text: &str, font: &FontDescription, max_width: f64) -> f64 {
        self.layout
            .measure_height(&self.fonts, text, font, max_width)
    }

    fn draw_text(
        &mut self,
        text: &str,
        font: &FontDescription,
        x: f64,
        y: f64,
        max_width: f64,
        align: TextAlign,
    ) {
        let line_height = self.fonts.line_height(font);
        let lines = self
            .layout
            .break_into_lines(&self.fonts, text, font, max_width)
            .into_iter()
            .enumerate()
            .map(|(i, line)| PositionedLine {
                x: x + line.offset(align, max_width),
                y: y + i as f64 * line_height,
                width: line.width,
                text: line.text,
            })
            .collect();
        let face = self.fonts.resolve(font);
        self.push(DrawCommand::Text {
            lines,
            font: font.clone(),
            face,
            line_height,
        });
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        self.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        });
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, line_width: f64) {
        self.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            line_width,
        });
    }

    fn begin_page(&mut self, _page: usize) {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        self.current = Some(RecordedPage::default());
    }

    fn end_page(&mut self, _page: usize) {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
    }
}
