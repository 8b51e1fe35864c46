use crate::model::{Block, BlockKind, PartyEntry};
use crate::plan::{DrawOp, FontVariant, LayoutPlan, Page, TextStyle};
use crate::style::LayoutStyle;

use super::{RenderBackend, TableRequest};

const UNDERLINE_OFFSET: f32 = 1.5;
const SIGNATURE_FIELD_GAP: f32 = 20.0;
const CAPTION_OFFSET: f32 = 5.0;
const FALLBACK_INDENT: f32 = 6.0; // continuation lines of a party entry

/// Everything the cover page shows besides the watermark.
pub struct Cover<'a> {
    pub title: &'a str,
    pub effective_date: &'a str,
    pub parties: &'a [PartyEntry],
}

/// Greedy word wrap. Hard line breaks in `text` are kept, blank lines are
/// dropped, and a single word wider than `max_width` is split by character.
pub fn wrap_text(measure: impl Fn(&str) -> f32, text: &str, max_width: f32) -> Vec<String> {
    let space_w = measure(" ");
    let mut lines = Vec::new();

    for hard_line in text.lines() {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in hard_line.split_whitespace() {
            let mut word = word.to_string();
            let mut ww = measure(&word);

            if ww > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(&measure, &word, max_width);
                word = pieces.pop().unwrap_or_default();
                ww = measure(&word);
                lines.extend(pieces);
                current_w = 0.0;
            }

            let proposed = if current.is_empty() {
                ww
            } else {
                current_w + space_w + ww
            };
            if !current.is_empty() && proposed > max_width {
                lines.push(std::mem::replace(&mut current, word));
                current_w = ww;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word);
                current_w = proposed;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn split_long_word(measure: &impl Fn(&str) -> f32, word: &str, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if measure(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Page under construction plus the vertical cursor. Threaded by value
/// through the fold over blocks; it is the only mutable layout state.
struct Cursor {
    done: Vec<Page>,
    page: Page,
    y: f32,
}

impl Cursor {
    fn new(top: f32) -> Self {
        Self {
            done: Vec::new(),
            page: Page::default(),
            y: top,
        }
    }

    fn break_page(&mut self, top: f32) {
        log::debug!(
            "Page break after body page {} at y={:.1}mm",
            self.done.len() + 1,
            self.y
        );
        self.done.push(std::mem::take(&mut self.page));
        self.y = top;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.page.is_empty() {
            self.done.push(self.page);
        }
        self.done
    }
}

struct Engine<'a> {
    style: &'a LayoutStyle,
    backend: &'a dyn RenderBackend,
}

impl Engine<'_> {
    fn margin(&self) -> f32 {
        self.style.geometry.margin_mm
    }

    fn usable_width(&self) -> f32 {
        self.style.geometry.usable_width_mm()
    }

    fn body_style(&self) -> TextStyle {
        TextStyle::new(FontVariant::Regular, self.style.body_size, self.style.text_color)
    }

    /// The uniform page-break rule, applied before every line.
    fn make_room(&self, cursor: &mut Cursor) {
        if cursor.y > self.style.break_limit_mm() {
            cursor.break_page(self.margin());
        }
    }

    fn draw_lines(&self, cursor: &mut Cursor, text: &str, style: TextStyle, line_h: f32) {
        for line in self.backend.wrap(text, self.usable_width(), &style) {
            self.make_room(cursor);
            cursor.page.push(DrawOp::Text {
                x: self.margin(),
                y: cursor.y,
                text: line,
                style,
            });
            cursor.y += line_h;
        }
    }

    fn place(&self, mut cursor: Cursor, block: &Block) -> Cursor {
        match block.kind {
            BlockKind::Heading => self.place_heading(&mut cursor, block),
            BlockKind::Signature => self.place_signature(&mut cursor, block),
            BlockKind::Body => {
                self.draw_lines(&mut cursor, &block.text, self.body_style(), self.style.body_line_h_mm);
                cursor.y += self.style.paragraph_gap_mm;
            }
        }
        cursor
    }

    fn place_heading(&self, cursor: &mut Cursor, block: &Block) {
        let style = TextStyle::new(FontVariant::Bold, self.style.heading_size, self.style.text_color);
        let x = self.margin();
        for line in self.backend.wrap(&block.text, self.usable_width(), &style) {
            self.make_room(cursor);
            let w = self.backend.text_width(&line, &style).min(self.usable_width());
            let rule_y = cursor.y + UNDERLINE_OFFSET;
            cursor.page.push(DrawOp::Text {
                x,
                y: cursor.y,
                text: line,
                style,
            });
            cursor.page.push(DrawOp::Line {
                x1: x,
                y1: rule_y,
                x2: x + w,
                y2: rule_y,
                width: 0.3,
                color: style.color,
            });
            cursor.y += self.style.heading_line_h_mm;
        }
    }

    fn place_signature(&self, cursor: &mut Cursor, block: &Block) {
        let g = &self.style.geometry;
        let threshold = g.page_height_mm - g.margin_mm - self.style.signature_min_space_mm;
        if cursor.y > threshold {
            log::debug!("Signature block moved to a fresh page (y={:.1}mm)", cursor.y);
            cursor.break_page(self.margin());
        } else {
            cursor.y += self.style.signature_lead_mm;
        }

        let line_h = self.style.body_line_h_mm;
        self.draw_lines(cursor, &block.text, self.body_style(), line_h);

        if block.text.contains("Signature") {
            cursor.y += line_h;
            self.make_room(cursor);
            let field_w = self
                .style
                .signature_field_width_mm
                .min((self.usable_width() - SIGNATURE_FIELD_GAP) / 2.0);
            let caption = TextStyle::new(FontVariant::Italic, self.style.caption_size, self.style.muted_color);
            let mut x = self.margin();
            for label in ["Signature", "Date"] {
                cursor.page.push(DrawOp::Line {
                    x1: x,
                    y1: cursor.y,
                    x2: x + field_w,
                    y2: cursor.y,
                    width: 0.3,
                    color: self.style.text_color,
                });
                cursor.page.push(DrawOp::Text {
                    x,
                    y: cursor.y + CAPTION_OFFSET,
                    text: label.to_string(),
                    style: caption,
                });
                x += field_w + SIGNATURE_FIELD_GAP;
            }
            cursor.y += 2.0 * line_h;
        }
        cursor.y += self.style.paragraph_gap_mm;
    }

    fn cover_page(&self, cover: &Cover) -> Page {
        let g = &self.style.geometry;
        let margin = g.margin_mm;
        let mut page = Page::default();
        let mut y = self.style.title_top_mm;

        let title_style = TextStyle::new(FontVariant::Bold, self.style.title_size, self.style.text_color);
        for line in self.backend.wrap(cover.title, self.usable_width(), &title_style) {
            let w = self.backend.text_width(&line, &title_style);
            page.push(DrawOp::Text {
                x: (g.page_width_mm - w) / 2.0,
                y,
                text: line,
                style: title_style,
            });
            y += self.style.title_line_h_mm;
        }

        let rule_y = y - self.style.title_line_h_mm + 6.0;
        page.push(DrawOp::Line {
            x1: margin,
            y1: rule_y,
            x2: g.page_width_mm - margin,
            y2: rule_y,
            width: 0.5,
            color: self.style.rule_color,
        });

        let text_style = TextStyle::new(FontVariant::Regular, self.style.cover_text_size, self.style.text_color);
        y = rule_y + 12.0;
        page.push(DrawOp::Text {
            x: margin,
            y,
            text: format!("Effective Date: {}", cover.effective_date),
            style: text_style,
        });
        y += 2.0 * self.style.cover_line_h_mm;

        if !cover.parties.is_empty() {
            let heading = TextStyle::new(FontVariant::Bold, self.style.heading_size, self.style.text_color);
            page.push(DrawOp::Text {
                x: margin,
                y,
                text: "Parties Involved".to_string(),
                style: heading,
            });
            y += 4.0;
            self.parties_table(&mut page, cover.parties, y, text_style);
        }

        page.push(watermark(self.style));
        page
    }

    fn parties_table(&self, page: &mut Page, parties: &[PartyEntry], top: f32, text_style: TextStyle) {
        let margin = self.margin();
        let request = TableRequest {
            header: vec!["Role".to_string(), "Name".to_string()],
            rows: parties
                .iter()
                .map(|p| vec![p.role_label.clone(), p.name.clone()])
                .collect(),
            header_style: TextStyle::new(FontVariant::Bold, self.style.table_text_size, [255, 255, 255]),
            body_style: TextStyle::new(FontVariant::Regular, self.style.table_text_size, self.style.text_color),
            header_fill: self.style.table_header_fill,
            border_color: self.style.rule_color,
            row_h: self.style.table_row_h_mm,
        };

        match self.backend.table(&request, margin, top, self.usable_width()) {
            Ok(table) => page.push(DrawOp::Table(table)),
            Err(e) => {
                log::warn!("Parties table not drawn ({e}), listing parties as text");
                let width = self.usable_width() - FALLBACK_INDENT;
                let mut y = top + self.style.cover_line_h_mm;
                for party in parties {
                    let entry = format!("{}: {}", party.role_label, party.name);
                    for (i, line) in self.backend.wrap(&entry, width, &text_style).into_iter().enumerate() {
                        page.push(DrawOp::Text {
                            x: if i == 0 { margin } else { margin + FALLBACK_INDENT },
                            y,
                            text: line,
                            style: text_style,
                        });
                        y += self.style.cover_line_h_mm;
                    }
                }
            }
        }
    }
}

pub(super) fn watermark(style: &LayoutStyle) -> DrawOp {
    let g = &style.geometry;
    DrawOp::Watermark {
        cx: g.page_width_mm / 2.0,
        cy: g.page_height_mm / 2.0,
        angle_deg: style.watermark_angle_deg,
        text: style.watermark_text.clone(),
        style: TextStyle::new(FontVariant::Bold, style.watermark_size, style.watermark_color),
    }
}

/// Cover page first, then the body blocks folded onto pages two onward.
/// Pure: the same blocks, cover and style always give the same plan.
pub fn layout(blocks: &[Block], cover: &Cover, style: &LayoutStyle, backend: &dyn RenderBackend) -> LayoutPlan {
    let engine = Engine { style, backend };

    let cover_page = engine.cover_page(cover);
    let body = blocks
        .iter()
        .fold(Cursor::new(engine.margin()), |cursor, block| engine.place(cursor, block))
        .finish();

    let mut pages = Vec::with_capacity(body.len() + 1);
    pages.push(cover_page);
    pages.extend(body);
    log::debug!("Laid out {} blocks on {} pages", blocks.len(), pages.len());

    LayoutPlan {
        geometry: style.geometry,
        pages,
    }
}
