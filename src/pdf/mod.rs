mod decorate;
mod layout;
mod table;

use std::collections::{BTreeMap, BTreeSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{EmbeddedFont, FontSet};
use crate::plan::{DrawOp, FontVariant, LayoutPlan, Page, TableOp, TextStyle};
use crate::style::LayoutStyle;

pub use decorate::{decorate, page_label};
pub use layout::{Cover, layout, wrap_text};

const PT_PER_MM: f32 = 72.0 / 25.4;

pub(crate) fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// What the layout engine asks of a table: content and look, no geometry.
#[derive(Clone, Debug)]
pub struct TableRequest {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub header_style: TextStyle,
    pub body_style: TextStyle,
    pub header_fill: [u8; 3],
    pub border_color: [u8; 3],
    pub row_h: f32,
}

/// Drawing backend the composition core lays out against.
///
/// Measurement and wrapping must agree with what `render` will draw. `table`
/// may refuse a request with `Error::RenderBackendFailure`; callers treat that
/// as a signal to fall back to plain lines.
pub trait RenderBackend {
    /// Width of `text` in millimetres.
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;

    fn wrap(&self, text: &str, max_width: f32, style: &TextStyle) -> Vec<String> {
        wrap_text(|s| self.text_width(s, style), text, max_width)
    }

    fn table(&self, request: &TableRequest, x: f32, y: f32, max_width: f32) -> Result<TableOp, Error>;

    fn render(&self, plan: &LayoutPlan) -> Result<Vec<u8>, Error>;
}

pub struct PdfBackend {
    fonts: FontSet,
    tables: bool,
}

impl PdfBackend {
    pub fn new(style: &LayoutStyle) -> Self {
        Self::with_fonts(FontSet::load(style.font_family.as_deref()))
    }

    pub fn with_fonts(fonts: FontSet) -> Self {
        Self { fonts, tables: true }
    }

    /// Refuse every table request, forcing the text-line fallback.
    pub fn without_tables(mut self) -> Self {
        self.tables = false;
        self
    }
}

impl Default for PdfBackend {
    fn default() -> Self {
        Self::with_fonts(FontSet::helvetica())
    }
}

impl RenderBackend for PdfBackend {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        self.fonts.text_width(text, style.variant, style.size)
    }

    fn table(&self, request: &TableRequest, x: f32, y: f32, max_width: f32) -> Result<TableOp, Error> {
        if !self.tables {
            return Err(Error::RenderBackendFailure("table drawing disabled".into()));
        }
        table::fit_table(request, x, y, max_width, |text, style| self.text_width(text, style))
    }

    fn render(&self, plan: &LayoutPlan) -> Result<Vec<u8>, Error> {
        render_pdf(plan, &self.fonts)
    }
}

fn used_chars(plan: &LayoutPlan) -> BTreeMap<FontVariant, BTreeSet<char>> {
    let mut used: BTreeMap<FontVariant, BTreeSet<char>> = BTreeMap::new();
    let mut add = |style: &TextStyle, text: &str| {
        let chars = used.entry(style.variant).or_default();
        chars.extend(text.chars());
        chars.insert(' ');
    };
    for op in plan.pages.iter().flat_map(|p| p.ops.iter()) {
        match op {
            DrawOp::Text { text, style, .. } | DrawOp::Watermark { text, style, .. } => add(style, text),
            DrawOp::Table(t) => {
                for cell in &t.header {
                    add(&t.header_style, cell);
                }
                for cell in t.rows.iter().flatten() {
                    add(&t.body_style, cell);
                }
            }
            DrawOp::Line { .. } => {}
        }
    }
    used
}

/// Draw context for one page: fonts plus the page height needed to flip the
/// top-left millimetre plan into PDF user space.
pub(crate) struct Painter<'a> {
    fonts: &'a BTreeMap<FontVariant, EmbeddedFont>,
    metrics: &'a FontSet,
    page_h: f32, // points
}

impl Painter<'_> {
    fn y(&self, y_mm: f32) -> f32 {
        self.page_h - pt(y_mm)
    }

    pub(crate) fn text(&self, content: &mut Content, x_mm: f32, y_mm: f32, text: &str, style: &TextStyle) {
        let Some(font) = self.fonts.get(&style.variant) else {
            return;
        };
        let [r, g, b] = style.color;
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.begin_text();
        content.set_font(Name(font.pdf_name.as_bytes()), style.size);
        content.next_line(pt(x_mm), self.y(y_mm));
        content.show(Str(&font.encode(text)));
        content.end_text();
    }

    pub(crate) fn line(
        &self,
        content: &mut Content,
        (x1, y1): (f32, f32),
        (x2, y2): (f32, f32),
        width_mm: f32,
        color: [u8; 3],
    ) {
        let [r, g, b] = color;
        content.save_state();
        content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.set_line_width(pt(width_mm));
        content.move_to(pt(x1), self.y(y1));
        content.line_to(pt(x2), self.y(y2));
        content.stroke();
        content.restore_state();
    }

    pub(crate) fn fill_rect(&self, content: &mut Content, x: f32, y_top: f32, w: f32, h: f32, color: [u8; 3]) {
        let [r, g, b] = color;
        content.save_state();
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.rect(pt(x), self.y(y_top + h), pt(w), pt(h));
        content.fill_nonzero();
        content.restore_state();
    }

    fn watermark(&self, content: &mut Content, cx: f32, cy: f32, angle_deg: f32, text: &str, style: &TextStyle) {
        let Some(font) = self.fonts.get(&style.variant) else {
            return;
        };
        let w = pt(self.metrics.text_width(text, style.variant, style.size));
        let cap_h = style.size * 0.7;
        let (s, c) = angle_deg.to_radians().sin_cos();
        let (cx, cy) = (pt(cx), self.y(cy));
        let ax = cx - w / 2.0 * c + cap_h / 2.0 * s;
        let ay = cy - w / 2.0 * s - cap_h / 2.0 * c;

        let [r, g, b] = style.color;
        content.save_state();
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        content.begin_text();
        content.set_font(Name(font.pdf_name.as_bytes()), style.size);
        content.set_text_matrix([c, s, -s, c, ax, ay]);
        content.show(Str(&font.encode(text)));
        content.end_text();
        content.restore_state();
    }

    fn page(&self, page: &Page) -> Content {
        let mut content = Content::new();
        // Watermarks go first so body text paints over them.
        for op in &page.ops {
            if let DrawOp::Watermark {
                cx,
                cy,
                angle_deg,
                text,
                style,
            } = op
            {
                self.watermark(&mut content, *cx, *cy, *angle_deg, text, style);
            }
        }
        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, style } => self.text(&mut content, *x, *y, text, style),
                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => self.line(&mut content, (*x1, *y1), (*x2, *y2), *width, *color),
                DrawOp::Table(t) => table::draw_table(&mut content, self, t),
                DrawOp::Watermark { .. } => {}
            }
        }
        content
    }
}

fn render_pdf(plan: &LayoutPlan, metrics: &FontSet) -> Result<Vec<u8>, Error> {
    if plan.pages.is_empty() {
        return Err(Error::SerializationFailure("layout produced no pages".into()));
    }
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let mut fonts: BTreeMap<FontVariant, EmbeddedFont> = BTreeMap::new();
    for (i, (variant, chars)) in used_chars(plan).into_iter().enumerate() {
        let entry = metrics.embed(&mut pdf, variant, format!("F{}", i + 1), &mut alloc, &chars);
        fonts.insert(variant, entry);
    }
    let t_fonts = t0.elapsed();

    let page_w = pt(plan.geometry.page_width_mm);
    let page_h = pt(plan.geometry.page_height_mm);
    let painter = Painter {
        fonts: &fonts,
        metrics,
        page_h,
    };
    let contents: Vec<Content> = plan.pages.iter().map(|p| painter.page(p)).collect();
    let t_paint = t0.elapsed();

    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for font in fonts.values() {
            font_dict.pair(Name(font.pdf_name.as_bytes()), font.font_ref);
        }
    }

    log::info!(
        "Render phases: fonts={:.1}ms, paint={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_paint - t_fonts).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_paint).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
