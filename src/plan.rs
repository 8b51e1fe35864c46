//! The page-by-page draw list produced by layout and consumed by the
//! decorator and the PDF backend. Coordinates are millimetres from the top-left
//! corner of the page; `y` on text is the baseline.

use crate::model::PageGeometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontVariant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant::Regular,
        FontVariant::Bold,
        FontVariant::Italic,
        FontVariant::BoldItalic,
    ];

    pub fn is_bold(self) -> bool {
        matches!(self, FontVariant::Bold | FontVariant::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontVariant::Italic | FontVariant::BoldItalic)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            FontVariant::Regular => 0,
            FontVariant::Bold => 1,
            FontVariant::Italic => 2,
            FontVariant::BoldItalic => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub variant: FontVariant,
    pub size: f32, // points
    pub color: [u8; 3],
}

impl TextStyle {
    pub fn new(variant: FontVariant, size: f32, color: [u8; 3]) -> Self {
        Self {
            variant,
            size,
            color,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableOp {
    pub x: f32,
    pub y: f32, // top edge
    pub col_widths: Vec<f32>,
    pub row_h: f32,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub header_style: TextStyle,
    pub body_style: TextStyle,
    pub header_fill: [u8; 3],
    pub border_color: [u8; 3],
    pub cell_padding: f32,
}

impl TableOp {
    pub fn width(&self) -> f32 {
        self.col_widths.iter().sum()
    }

    pub fn height(&self) -> f32 {
        (self.rows.len() + 1) as f32 * self.row_h
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: [u8; 3],
    },
    Table(TableOp),
    /// Rotated label centred on (`cx`, `cy`), painted beneath everything else.
    Watermark {
        cx: f32,
        cy: f32,
        angle_deg: f32,
        text: String,
        style: TextStyle,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Text of every plain text op on the page, in draw order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn has_watermark(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, DrawOp::Watermark { .. }))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl LayoutPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
