mod common;

use common::{CountingBackend, ScriptedService};
use legaldoc_pdf::{
    DocumentGenerator, Error, LayoutStyle, StaticTextService, TemplateRegistry, check_complete,
};

fn generator(text: &str) -> DocumentGenerator<ScriptedService> {
    DocumentGenerator::new(TemplateRegistry::builtin(), ScriptedService::text(text), LayoutStyle::default())
        .with_effective_date("January 1, 2025")
}

#[test]
fn unknown_template_is_rejected_before_the_service() {
    let mut generator = generator(common::NDA_TEXT);
    let calls = generator_calls(&generator);
    let err = generator.generate("Will", &common::nda_fields()).unwrap_err();
    assert!(matches!(err, Error::UnknownTemplate(ref id) if id == "Will"));
    assert_eq!(calls.get(), 0);
}

#[test]
fn first_missing_field_is_named_in_template_order() {
    let mut generator = generator(common::NDA_TEXT);
    let calls = generator_calls(&generator);
    let fields = common::pairs(&[
        ("disclosingParty", "Acme Inc."),
        ("receivingParty", "   "),
        ("duration", "2 years"),
    ]);
    let err = generator.generate("NDA", &fields).unwrap_err();
    match err {
        Error::MissingField { key, label } => {
            assert_eq!(key, "receivingParty");
            assert_eq!(label, "Receiving Party");
        }
        other => panic!("expected MissingField, got {other:?}"),
    }
    assert_eq!(calls.get(), 0);
}

#[test]
fn complete_fields_reach_the_service_once() {
    let mut generator = generator(common::NDA_TEXT);
    let calls = generator_calls(&generator);
    let handle = generator.generate("NDA", &common::nda_fields()).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(generator.fetch_document_text(handle).unwrap(), common::NDA_TEXT);
}

#[test]
fn every_builtin_template_accepts_its_full_field_list() {
    let mut generator = DocumentGenerator::new(
        TemplateRegistry::builtin(),
        StaticTextService::new(common::NDA_TEXT),
        LayoutStyle::default(),
    );
    let templates = generator.registry().list_templates().to_vec();
    assert_eq!(templates.len(), 6);
    for t in templates {
        let fields: Vec<(String, String)> = t
            .fields
            .iter()
            .map(|f| (f.key.clone(), format!("value for {}", f.label)))
            .collect();
        assert!(generator.generate(&t.id, &fields).is_ok(), "{} rejected", t.id);
    }
}

#[test]
fn handles_are_sequential_and_checked() {
    let mut generator = generator(common::NDA_TEXT);
    let a = generator.generate("NDA", &common::nda_fields()).unwrap();
    let b = generator.generate("NDA", &common::nda_fields()).unwrap();
    assert_eq!(b.id(), a.id() + 1);

    let other = DocumentGenerator::new(
        TemplateRegistry::builtin(),
        StaticTextService::new("unused"),
        LayoutStyle::default(),
    );
    assert!(matches!(other.export_text(b), Err(Error::UnknownDocument(id)) if id == b.id()));
}

#[test]
fn incomplete_text_never_reaches_layout() {
    for text in ["", "  \n ", "Error: quota exceeded", "Payment Error occurred."] {
        let backend = CountingBackend::new();
        let measured = backend.measured.clone();
        let mut generator = generator(text).with_backend(Box::new(backend));
        let handle = generator.generate("NDA", &common::nda_fields()).unwrap();

        let err = generator.compose(handle).unwrap_err();
        assert!(matches!(err, Error::IncompleteGeneration(_)), "{text:?} gave {err:?}");
        assert_eq!(measured.get(), 0, "layout ran for {text:?}");
    }
}

#[test]
fn completeness_check_spots_placeholders() {
    assert!(check_complete("Signed by {{disclosingParty}} today.").is_err());
    assert!(check_complete("Signed by ${name} today.").is_err());
    assert!(check_complete("Signed by [PARTY_NAME] on [DATE].").is_err());

    assert!(check_complete("See clause [a] of section 2.").is_ok());
    assert!(check_complete("Refer to Schedule [1].").is_ok());
    assert!(check_complete(common::NDA_TEXT).is_ok());
}

#[test]
fn export_text_is_exactly_the_generated_text() {
    let mut generator = generator(common::NDA_TEXT);
    let handle = generator.generate("NDA", &common::nda_fields()).unwrap();
    assert_eq!(generator.export_text(handle).unwrap(), common::NDA_TEXT);
}

#[test]
fn date_field_overrides_the_default_effective_date() {
    let mut generator = generator(common::NDA_TEXT);
    let fields = common::pairs(&[
        ("partner1", "Ann Lee"),
        ("partner2", "Bo Chan"),
        ("businessName", "Lee & Chan"),
        ("profitSharing", "50/50"),
        ("effectiveDate", "2025-03-01"),
        ("jurisdiction", "Oregon"),
    ]);
    let handle = generator.generate("Partnership", &fields).unwrap();
    let plan = generator.compose(handle).unwrap();
    assert!(plan.pages[0].text_lines().contains(&"Effective Date: 2025-03-01"));

    let handle = generator.generate("NDA", &common::nda_fields()).unwrap();
    let plan = generator.compose(handle).unwrap();
    assert!(plan.pages[0].text_lines().contains(&"Effective Date: January 1, 2025"));
}

#[test]
fn nda_end_to_end_plan() {
    common::init_logging();
    let mut generator = generator(common::NDA_TEXT);
    let handle = generator.generate("NDA", &common::nda_fields()).unwrap();
    let plan = generator.compose(handle).unwrap();

    assert!(plan.page_count() >= 2);

    let cover = &plan.pages[0];
    assert!(cover.text_lines().contains(&"NON-DISCLOSURE AGREEMENT"));
    assert!(cover.text_lines().contains(&"Parties Involved"));
    let tables: Vec<_> = cover.tables().collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].header, ["Role", "Name"]);
    assert_eq!(
        tables[0].rows,
        vec![
            vec!["disclosingParty".to_string(), "Acme Inc.".to_string()],
            vec!["receivingParty".to_string(), "Jane Doe".to_string()],
        ]
    );

    let body = &plan.pages[1];
    assert!(body.text_lines().contains(&"1. Confidential Information"));
    let last_body = plan.pages.last().unwrap().text_lines();
    assert!(last_body.contains(&"Signature"));
    assert!(last_body.contains(&"Date"));
}

#[test]
fn composing_twice_gives_the_same_plan() {
    let mut generator = generator(common::NDA_TEXT);
    let handle = generator.generate("NDA", &common::nda_fields()).unwrap();
    assert_eq!(generator.compose(handle).unwrap(), generator.compose(handle).unwrap());
}

fn generator_calls(
    generator: &DocumentGenerator<ScriptedService>,
) -> std::rc::Rc<std::cell::Cell<usize>> {
    generator.service().calls.clone()
}
