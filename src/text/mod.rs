//! # Text Layout
//!
//! Greedy line breaking at UAX#14 opportunities, against the standard font
//! metrics of [`FontContext`]. Words wider than the line are force-broken.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::FontContext;
use crate::style::{FontDescription, TextAlign};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width without trailing spaces.
    pub width: f64,
}

impl BrokenLine {
    /// Left offset of this line inside a box `max_width` wide.
    pub fn offset(&self, align: TextAlign, max_width: f64) -> f64 {
        let slack = (max_width - self.width).max(0.0);
        match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => slack / 2.0,
            TextAlign::Right => slack,
        }
    }
}

/// Break opportunity before each char index. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width`. Empty text yields a
    /// single empty line.
    pub fn break_into_lines(
        &self,
        fonts: &FontContext,
        text: &str,
        font: &FontDescription,
        max_width: f64,
    ) -> Vec<BrokenLine> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let widths: Vec<f64> = chars.iter().map(|&ch| fonts.char_width(ch, font)).collect();
        let opportunities = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 {
                match opportunities[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let mut end = i;
                        while end > line_start && is_newline(chars[end - 1]) {
                            end -= 1;
                        }
                        lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
                        line_start = i;
                        line_width = 0.0;
                        last_break = None;
                    }
                    Some(BreakOpportunity::Allowed) => last_break = Some(i - 1),
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            // Spaces hang past the edge; they are trimmed from the line.
            if ch == ' ' {
                line_width += widths[i];
                continue;
            }

            if line_width + widths[i] > max_width && line_start < i {
                match last_break.filter(|&bp| bp >= line_start) {
                    Some(bp) => {
                        lines.push(make_line(&chars[line_start..=bp], &widths[line_start..=bp]));
                        line_start = bp + 1;
                        line_width = widths[line_start..=i].iter().sum();
                    }
                    None => {
                        lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                        line_start = i;
                        line_width = widths[i];
                    }
                }
                last_break = None;
                continue;
            }

            line_width += widths[i];
        }

        if line_start < chars.len() {
            let tail: Vec<char> = chars[line_start..]
                .iter()
                .copied()
                .filter(|&c| !is_newline(c))
                .collect();
            let tail_widths: Vec<f64> = chars[line_start..]
                .iter()
                .zip(&widths[line_start..])
                .filter(|(c, _)| !is_newline(**c))
                .map(|(_, w)| *w)
                .collect();
            lines.push(make_line(&tail, &tail_widths));
        }
        if lines.is_empty() {
            lines.push(make_line(&[], &[]));
        }
        lines
    }

    /// Height of `text` laid out in `max_width`: line count times line height.
    pub fn measure_height(
        &self,
        fonts: &FontContext,
        text: &str,
        font: &FontDescription,
        max_width: f64,
    ) -> f64 {
        let lines = self.break_into_lines(fonts, text, font, max_width);
        lines.len() as f64 * fonts.line_height(font)
    }
}

fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && chars[end - 1] == ' ' {
        end -= 1;
    }
    BrokenLine {
        text: chars[..end].iter().collect(),
        width: widths[..end].iter().sum(),
    }
}
