//! # PDF Serializer
//!
//! Writes recorded pages as a PDF 1.7 file. Text uses the standard Type1
//! fonts with WinAnsiEncoding, so nothing is embedded; each page's content
//! stream is zlib-compressed.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, streams, info
//! xref                <- byte offset of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Recorded coordinates are relative to the top-left of the printable area
//! with `y` growing downward; the writer shifts them by the margins and
//! flips them into PDF user space.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::StandardFont;
use crate::model::{Metadata, PageConfig};
use crate::surface::{DrawCommand, RecordedPage};

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

/// Objects allocated so far. Index is the object number; slot 0 is unused.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    fonts: Vec<(StandardFont, usize)>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }
}

/// Maps the margins and page height onto PDF user space.
#[derive(Debug, Clone, Copy)]
struct Transform {
    left: f64,
    top: f64,
    page_height: f64,
}

impl Transform {
    fn x(&self, x: f64) -> f64 {
        self.left + x
    }

    fn y(&self, y: f64) -> f64 {
        self.page_height - self.top - y
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write recorded pages to a PDF byte vector. An empty page list still
    /// produces one blank page.
    pub fn write(&self, pages: &[RecordedPage], config: &PageConfig, metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            fonts: Vec::new(),
        };

        self.register_fonts(&mut builder, pages);

        let (width, height) = config.size.dimensions();
        let transform = Transform {
            left: config.margin.left,
            top: config.margin.top,
            page_height: height,
        };
        let font_resources = self.build_font_resource_dict(&builder.fonts);

        let blank = [RecordedPage::default()];
        let pages = if pages.is_empty() { &blank[..] } else { pages };

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, transform, &builder.fonts);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let mut stream: Vec<u8> = Vec::new();
            let _ = write!(
                stream,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            stream.extend_from_slice(&compressed);
            stream.extend_from_slice(b"\nendstream");
            let content_id = builder.push(stream);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                width, height, content_id, font_resources
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();

        let info_id = self.build_info(&mut builder, metadata);
        log::debug!(
            "writing PDF with {} pages and {} fonts",
            page_ids.len(),
            builder.fonts.len()
        );
        self.serialize(&builder, info_id)
    }

    fn build_info(&self, builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        if metadata.title.is_none() && metadata.author.is_none() && metadata.subject.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        if let Some(title) = &metadata.title {
            let _ = write!(info, "/Title ({}) ", encode_text(title));
        }
        if let Some(author) = &metadata.author {
            let _ = write!(info, "/Author ({}) ", encode_text(author));
        }
        if let Some(subject) = &metadata.subject {
            let _ = write!(info, "/Subject ({}) ", encode_text(subject));
        }
        info.push_str("/Producer (tableprint) >>");
        Some(builder.push(info.into_bytes()))
    }

    /// One font object per face used, in a stable order.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[RecordedPage]) {
        let mut faces: Vec<StandardFont> = pages
            .iter()
            .flat_map(|page| &page.commands)
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { face, .. } => Some(*face),
                _ => None,
            })
            .collect();
        faces.sort();
        faces.dedup();

        for face in faces {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                face.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.fonts.push((face, id));
        }
    }

    fn build_font_resource_dict(&self, fonts: &[(StandardFont, usize)]) -> String {
        fonts
            .iter()
            .enumerate()
            .map(|(i, (_, id))| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_content_stream(
        &self,
        page: &RecordedPage,
        t: Transform,
        fonts: &[(StandardFont, usize)],
    ) -> String {
        let mut stream = String::new();
        for command in &page.commands {
            match command {
                DrawCommand::Text {
                    lines,
                    font,
                    face,
                    line_height,
                } => {
                    let index = fonts.iter().position(|(f, _)| f == face).unwrap_or(0);
                    let metrics = face.metrics();
                    let ascent = font.size * f64::from(metrics.ascender) / 1000.0;
                    let descent = -font.size * f64::from(metrics.descender) / 1000.0;
                    // Centre the glyph box in the line box.
                    let baseline = (line_height - ascent - descent) / 2.0 + ascent;
                    let scale = font.stretch.factor() * 100.0;
                    for line in lines.iter().filter(|l| !l.text.is_empty()) {
                        let _ = write!(stream, "BT /F{} {:.2} Tf ", index, font.size);
                        if (scale - 100.0).abs() > f64::EPSILON {
                            let _ = write!(stream, "{:.1} Tz ", scale);
                        }
                        let _ = writeln!(
                            stream,
                            "{:.2} {:.2} Td ({}) Tj ET",
                            t.x(line.x),
                            t.y(line.y + baseline),
                            encode_text(&line.text)
                        );
                    }
                }
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                } => {
                    let _ = writeln!(
                        stream,
                        "{:.2} w {:.2} {:.2} m {:.2} {:.2} l S",
                        width,
                        t.x(*x1),
                        t.y(*y1),
                        t.x(*x2),
                        t.y(*y2)
                    );
                }
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    line_width,
                } => {
                    let _ = writeln!(
                        stream,
                        "{:.2} w {:.2} {:.2} {:.2} {:.2} re S",
                        line_width,
                        t.x(*x),
                        t.y(y + height),
                        width,
                        height
                    );
                }
            }
        }
        stream
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(id) = info_id {
            let _ = write!(output, " /Info {} 0 R", id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);
        output
    }
}

/// WinAnsiEncoding code for `ch`, if it has one.
fn win_ansi(ch: char) -> Option<u8> {
    let code = ch as u32;
    match ch {
        ' '..='~' => Some(code as u8),
        '\u{a0}'..='\u{ff}' => Some(code as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        'ƒ' => Some(0x83),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '†' => Some(0x86),
        '‡' => Some(0x87),
        'ˆ' => Some(0x88),
        '‰' => Some(0x89),
        'Š' => Some(0x8a),
        '‹' => Some(0x8b),
        'Œ' => Some(0x8c),
        'Ž' => Some(0x8e),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '˜' => Some(0x98),
        '™' => Some(0x99),
        'š' => Some(0x9a),
        '›' => Some(0x9b),
        'œ' => Some(0x9c),
        'ž' => Some(0x9e),
        'Ÿ' => Some(0x9f),
        _ => None,
    }
}

/// Encode text as the body of a PDF literal string: WinAnsi bytes, with
/// delimiters escaped and non-ASCII bytes as octal escapes. Characters
/// outside WinAnsi become `?`.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match win_ansi(ch).unwrap_or(b'?') {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            byte @ 0x20..=0x7e => out.push(byte as char),
            byte => {
                let _ = write!(out, "\\{:03o}", byte);
            }
        }
    }
    out
}
