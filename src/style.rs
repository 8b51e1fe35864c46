use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::PageGeometry;

/// Every constant the layout engine and decorator use. Millimetres for
/// distances, points for font sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    pub geometry: PageGeometry,
    /// TrueType family to embed; `None` keeps the built-in Helvetica.
    pub font_family: Option<String>,

    pub title_size: f32,
    pub title_top_mm: f32,
    pub title_line_h_mm: f32,
    pub cover_text_size: f32,
    pub cover_line_h_mm: f32,

    pub heading_size: f32,
    pub heading_line_h_mm: f32,
    pub body_size: f32,
    pub body_line_h_mm: f32,
    pub paragraph_gap_mm: f32,
    /// Space kept free above the bottom margin before a line forces a break.
    pub line_reserve_mm: f32,

    /// Room a signature block needs; less than this left on the page starts a new one.
    pub signature_min_space_mm: f32,
    pub signature_lead_mm: f32,
    pub signature_field_width_mm: f32,
    pub caption_size: f32,

    pub table_header_fill: [u8; 3],
    pub table_row_h_mm: f32,
    pub table_text_size: f32,

    pub header_size: f32,
    pub footer_size: f32,
    pub attribution: String,

    pub watermark_text: String,
    pub watermark_size: f32,
    pub watermark_angle_deg: f32,
    pub watermark_color: [u8; 3],

    pub text_color: [u8; 3],
    pub muted_color: [u8; 3],
    pub rule_color: [u8; 3],
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            font_family: None,
            title_size: 22.0,
            title_top_mm: 60.0,
            title_line_h_mm: 10.0,
            cover_text_size: 12.0,
            cover_line_h_mm: 8.0,
            heading_size: 14.0,
            heading_line_h_mm: 10.0,
            body_size: 11.0,
            body_line_h_mm: 6.0,
            paragraph_gap_mm: 4.0,
            line_reserve_mm: 10.0,
            signature_min_space_mm: 40.0,
            signature_lead_mm: 10.0,
            signature_field_width_mm: 60.0,
            caption_size: 9.0,
            table_header_fill: [41, 65, 122],
            table_row_h_mm: 9.0,
            table_text_size: 11.0,
            header_size: 9.0,
            footer_size: 9.0,
            attribution: "Generated by LexAI Legal Document Generator".into(),
            watermark_text: "CONFIDENTIAL".into(),
            watermark_size: 60.0,
            watermark_angle_deg: 45.0,
            watermark_color: [235, 235, 235],
            text_color: [20, 20, 20],
            muted_color: [110, 110, 110],
            rule_color: [150, 150, 150],
        }
    }
}

impl LayoutStyle {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let style: LayoutStyle =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        style.validate()?;
        Ok(style)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Self::from_json(&json)
    }

    /// Lowest y a line may start at before the page must break.
    pub fn break_limit_mm(&self) -> f32 {
        self.geometry.page_height_mm - self.geometry.margin_mm - self.line_reserve_mm
    }

    pub fn validate(&self) -> Result<(), Error> {
        let g = &self.geometry;
        if g.usable_width_mm() <= 0.0 {
            return Err(Error::Config(format!(
                "margin {}mm leaves no usable width on a {}mm page",
                g.margin_mm, g.page_width_mm
            )));
        }
        if self.break_limit_mm() <= g.margin_mm {
            return Err(Error::Config(format!(
                "page height {}mm leaves no room for body text",
                g.page_height_mm
            )));
        }
        if self.body_line_h_mm <= 0.0 || self.heading_line_h_mm <= 0.0 {
            return Err(Error::Config("line heights must be positive".into()));
        }
        Ok(())
    }
}
