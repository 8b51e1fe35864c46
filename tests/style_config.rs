use std::io::Write;

use legaldoc_pdf::{Error, LayoutStyle, PageGeometry};

#[test]
fn defaults_are_a4_with_twenty_millimetre_margins() {
    let style = LayoutStyle::default();
    assert_eq!(style.geometry, PageGeometry::A4);
    assert_eq!(style.geometry.usable_width_mm(), 170.0);
    assert_eq!(style.break_limit_mm(), 267.0);
    assert!(style.validate().is_ok());
}

#[test]
fn partial_json_keeps_other_defaults() {
    let style = LayoutStyle::from_json(
        r#"{"geometry": {"margin_mm": 25, "page_width_mm": 215.9, "page_height_mm": 279.4}, "body_size": 10}"#,
    )
    .unwrap();
    assert_eq!(style.geometry.margin_mm, 25.0);
    assert_eq!(style.body_size, 10.0);
    assert_eq!(style.heading_size, LayoutStyle::default().heading_size);
    assert_eq!(style.watermark_text, "CONFIDENTIAL");
}

#[test]
fn invalid_json_and_geometry_are_config_errors() {
    assert!(matches!(LayoutStyle::from_json("{not json"), Err(Error::Config(_))));
    assert!(matches!(
        LayoutStyle::from_json(r#"{"geometry": {"margin_mm": 120, "page_width_mm": 210, "page_height_mm": 297}}"#),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        LayoutStyle::from_json(r#"{"body_line_h_mm": 0}"#),
        Err(Error::Config(_))
    ));
}

#[test]
fn reads_style_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"font_family": "Liberation Sans", "footer_size": 8}}"#).unwrap();
    let style = LayoutStyle::from_json_file(file.path()).unwrap();
    assert_eq!(style.font_family.as_deref(), Some("Liberation Sans"));
    assert_eq!(style.footer_size, 8.0);

    let missing = file.path().with_extension("missing");
    assert!(matches!(LayoutStyle::from_json_file(&missing), Err(Error::Io(_))));
}

#[test]
fn style_round_trips_through_json() {
    let style = LayoutStyle::default();
    let json = serde_json::to_string(&style).unwrap();
    assert_eq!(LayoutStyle::from_json(&json).unwrap(), style);
}
