mod common;

use common::MonospaceBackend;
use legaldoc_pdf::{
    Block, BlockKind, Cover, DrawOp, LayoutStyle, PartyEntry, PdfBackend, RenderBackend, classify, layout,
    wrap_text,
};

fn empty_cover() -> Cover<'static> {
    Cover {
        title: "SERVICE AGREEMENT",
        effective_date: "January 1, 2025",
        parties: &[],
    }
}

fn text_positions(plan: &legaldoc_pdf::LayoutPlan, page: usize) -> Vec<(String, f32)> {
    plan.pages[page]
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, y, .. } => Some((text.clone(), *y)),
            _ => None,
        })
        .collect()
}

#[test]
fn body_breaks_after_line_42_with_default_style() {
    let style = LayoutStyle::default();
    let blocks = vec![Block::new(BlockKind::Body, common::numbered_lines(60))];
    let plan = layout(&blocks, &empty_cover(), &style, &PdfBackend::default());

    assert_eq!(plan.page_count(), 3);
    let first = text_positions(&plan, 1);
    assert_eq!(first.len(), 42);
    assert_eq!(first[0], ("Line 1".to_string(), 20.0));
    assert_eq!(first.last().unwrap().0, "Line 42");
    assert!(first.iter().all(|(_, y)| *y <= style.break_limit_mm()));

    let second = text_positions(&plan, 2);
    assert_eq!(second[0], ("Line 43".to_string(), style.geometry.margin_mm));
    assert_eq!(second.last().unwrap().0, "Line 60");
}

#[test]
fn layout_is_deterministic() {
    let style = LayoutStyle::default();
    let blocks = classify(common::NDA_TEXT);
    let backend = PdfBackend::default();
    let a = layout(&blocks, &empty_cover(), &style, &backend);
    let b = layout(&blocks, &empty_cover(), &style, &backend);
    assert_eq!(a, b);
}

#[test]
fn no_blocks_gives_only_the_cover() {
    let plan = layout(&[], &empty_cover(), &LayoutStyle::default(), &PdfBackend::default());
    assert_eq!(plan.page_count(), 1);
    assert!(plan.pages[0].has_watermark());
}

#[test]
fn heading_gets_an_underline_of_its_width() {
    let backend = MonospaceBackend { width: 2.0 };
    let blocks = vec![Block::new(BlockKind::Heading, "1. Scope")];
    let plan = layout(&blocks, &empty_cover(), &LayoutStyle::default(), &backend);

    let page = &plan.pages[1];
    let underline = page
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::Line { x1, x2, y1, .. } => Some((*x1, *x2, *y1)),
            _ => None,
        })
        .unwrap();
    assert_eq!(underline, (20.0, 20.0 + 16.0, 21.5));
}

#[test]
fn signature_near_the_bottom_moves_to_a_new_page() {
    let style = LayoutStyle::default();
    // Forty body lines leave the cursor below the 237mm signature threshold.
    let blocks = vec![
        Block::new(BlockKind::Body, common::numbered_lines(40)),
        Block::new(BlockKind::Signature, "_________________________ Signature"),
    ];
    let plan = layout(&blocks, &empty_cover(), &style, &PdfBackend::default());
    assert_eq!(plan.page_count(), 3);

    let sig_page = text_positions(&plan, 2);
    assert_eq!(sig_page[0], ("_________________________ Signature".to_string(), 20.0));
    let captions: Vec<&str> = sig_page.iter().skip(1).map(|(t, _)| t.as_str()).collect();
    assert_eq!(captions, ["Signature", "Date"]);
}

#[test]
fn signature_with_room_gets_lead_in_space() {
    let style = LayoutStyle::default();
    let blocks = vec![
        Block::new(BlockKind::Body, "Short paragraph."),
        Block::new(BlockKind::Signature, "Printed Name: ____________"),
    ];
    let plan = layout(&blocks, &empty_cover(), &style, &PdfBackend::default());
    assert_eq!(plan.page_count(), 2);

    let lines = text_positions(&plan, 1);
    // 20 + 6 (line) + 4 (gap) + 10 (lead-in)
    assert_eq!(lines[1], ("Printed Name: ____________".to_string(), 40.0));
    // No "Signature" in the text, so no rule fields.
    assert_eq!(lines.len(), 2);
    assert!(!plan.pages[1].ops.iter().any(|op| matches!(op, DrawOp::Line { .. })));
}

#[test]
fn cover_lists_parties_as_text_when_tables_fail() {
    let parties = vec![
        PartyEntry {
            role_label: "landlord".into(),
            name: "Jane Smith".into(),
        },
        PartyEntry {
            role_label: "tenant".into(),
            name: "John Roe".into(),
        },
    ];
    let cover = Cover {
        title: "RENTAL AGREEMENT",
        effective_date: "2025-02-01",
        parties: &parties,
    };
    let backend = PdfBackend::default().without_tables();
    let plan = layout(&[], &cover, &LayoutStyle::default(), &backend);

    let cover_page = &plan.pages[0];
    assert_eq!(cover_page.tables().count(), 0);
    let lines = cover_page.text_lines();
    let pos = |s: &str| lines.iter().position(|l| *l == s).unwrap();
    assert!(pos("Parties Involved") < pos("landlord: Jane Smith"));
    assert!(pos("landlord: Jane Smith") < pos("tenant: John Roe"));
}

#[test]
fn cover_omits_parties_section_without_parties() {
    let plan = layout(&[], &empty_cover(), &LayoutStyle::default(), &PdfBackend::default());
    let cover = &plan.pages[0];
    assert!(!cover.text_lines().contains(&"Parties Involved"));
    assert_eq!(cover.tables().count(), 0);
    assert_eq!(cover.text_lines(), ["SERVICE AGREEMENT", "Effective Date: January 1, 2025"]);
}

#[test]
fn overlong_table_falls_back_to_text() {
    let long_name = "Very Long Company Name ".repeat(8);
    let parties = vec![PartyEntry {
        role_label: "seller".into(),
        name: long_name.trim().to_string(),
    }];
    let cover = Cover {
        title: "PURCHASE AGREEMENT",
        effective_date: "2025-03-01",
        parties: &parties,
    };
    let style = LayoutStyle::default();
    let backend = PdfBackend::default();
    let plan = layout(&[], &cover, &style, &backend);
    let cover_page = &plan.pages[0];
    assert_eq!(cover_page.tables().count(), 0);

    let right_edge = style.geometry.page_width_mm - style.geometry.margin_mm;
    let entry: Vec<(f32, f32, &str)> = cover_page
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { x, y, text, style } => Some((*x, *y, text.as_str(), style)),
            _ => None,
        })
        .skip_while(|(_, _, text, _)| !text.starts_with("seller: "))
        .map(|(x, y, text, text_style)| {
            assert!(
                x + backend.text_width(text, text_style) <= right_edge,
                "{text:?} runs past the right margin"
            );
            (x, y, text)
        })
        .collect();

    assert!(entry.len() > 1, "long entry was not wrapped");
    assert_eq!(entry[0].0, style.geometry.margin_mm);
    assert!(entry[1..].iter().all(|(x, _, _)| *x > style.geometry.margin_mm));
    assert!(entry.windows(2).all(|w| w[1].1 > w[0].1));
    let rejoined: Vec<&str> = entry.iter().map(|(_, _, t)| *t).collect();
    assert_eq!(rejoined.join(" "), format!("seller: {}", long_name.trim()));
}

#[test]
fn wrap_respects_width_and_splits_long_words() {
    let measure = |s: &str| s.chars().count() as f32;
    assert_eq!(wrap_text(measure, "aa bb cc dd", 5.0), ["aa bb", "cc dd"]);
    assert_eq!(wrap_text(measure, "abcdefghijk", 4.0), ["abcd", "efgh", "ijk"]);
    assert_eq!(wrap_text(measure, "one\n\ntwo", 10.0), ["one", "two"]);
    assert!(wrap_text(measure, "   ", 10.0).is_empty());
}
