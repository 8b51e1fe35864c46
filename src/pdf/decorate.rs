use crate::plan::{DrawOp, FontVariant, LayoutPlan, TextStyle};
use crate::style::LayoutStyle;

use super::RenderBackend;
use super::layout::watermark;

const HEADER_OFFSET: f32 = 8.0; // above the top margin
const HEADER_RULE_OFFSET: f32 = 5.0;
const FOOTER_OFFSET: f32 = 10.0; // above the bottom page edge
const FOOTER_RULE_OFFSET: f32 = 15.0;

/// Footer counter: roman "I" on the cover, then body pages numbered from 1
/// out of the body page count.
pub fn page_label(page_idx: usize, page_count: usize) -> String {
    if page_idx == 0 {
        "Page I".to_string()
    } else {
        format!("Page {} of {}", page_idx, page_count.saturating_sub(1))
    }
}

/// Overlay header, footer and watermark on every page. Only appends draw
/// operations; nothing the layout placed moves. Pages that already carry a
/// watermark (the cover) are not stamped twice.
pub fn decorate(mut plan: LayoutPlan, title: &str, style: &LayoutStyle, backend: &dyn RenderBackend) -> LayoutPlan {
    let g = plan.geometry;
    let left = g.margin_mm;
    let right = g.page_width_mm - g.margin_mm;
    let page_count = plan.pages.len();

    let header_style = TextStyle::new(FontVariant::Italic, style.header_size, style.muted_color);
    let footer_style = TextStyle::new(FontVariant::Regular, style.footer_size, style.muted_color);

    for (idx, page) in plan.pages.iter_mut().enumerate() {
        if idx > 0 {
            let header_y = g.margin_mm - HEADER_OFFSET;
            let rule_y = g.margin_mm - HEADER_RULE_OFFSET;
            page.push(DrawOp::Text {
                x: left,
                y: header_y,
                text: title.to_string(),
                style: header_style,
            });
            page.push(DrawOp::Line {
                x1: left,
                y1: rule_y,
                x2: right,
                y2: rule_y,
                width: 0.2,
                color: style.rule_color,
            });
        }

        let footer_y = g.page_height_mm - FOOTER_OFFSET;
        let footer_rule_y = g.page_height_mm - FOOTER_RULE_OFFSET;
        page.push(DrawOp::Line {
            x1: left,
            y1: footer_rule_y,
            x2: right,
            y2: footer_rule_y,
            width: 0.2,
            color: style.rule_color,
        });
        page.push(DrawOp::Text {
            x: left,
            y: footer_y,
            text: style.attribution.clone(),
            style: footer_style,
        });
        let label = page_label(idx, page_count);
        let label_w = backend.text_width(&label, &footer_style);
        page.push(DrawOp::Text {
            x: right - label_w,
            y: footer_y,
            text: label,
            style: footer_style,
        });

        if !page.has_watermark() {
            page.push(watermark(style));
        }
    }

    plan
}
