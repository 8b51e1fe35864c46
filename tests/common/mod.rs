#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use legaldoc_pdf::{
    Error, LayoutPlan, PdfBackend, RenderBackend, ServiceError, TableOp, TableRequest,
    TemplateService, TextStyle,
};
use serde_json::Value;

pub const NDA_TEXT: &str = "\
NON-DISCLOSURE AGREEMENT

This Non-Disclosure Agreement is entered into by Acme Inc. and Jane Doe for the purpose of business collaboration between the two parties.

1. Confidential Information

The Receiving Party shall hold in strict confidence all technical, commercial and financial information disclosed by the Disclosing Party, and shall not use that information for any purpose other than the purpose stated above.

2. Term

The obligations of this Agreement remain in force for 2 years from the date on the cover page of this Agreement.

3. Governing Law

This Agreement is governed by and construed in accordance with the laws of California.

_________________________ Signature
Acme Inc.
";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn pairs(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn nda_fields() -> Vec<(String, String)> {
    pairs(&[
        ("disclosingParty", "Acme Inc."),
        ("receivingParty", "Jane Doe"),
        ("purpose", "Business collaboration"),
        ("duration", "2 years"),
        ("jurisdiction", "California"),
    ])
}

/// "Line 1\nLine 2\n..." as one paragraph with hard breaks.
pub fn numbered_lines(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Line {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serves a fixed catalogue payload and counts generation requests.
pub struct ScriptedService {
    pub catalogue: Result<Value, ServiceError>,
    pub text: Result<String, ServiceError>,
    pub calls: Rc<Cell<usize>>,
}

impl ScriptedService {
    pub fn catalogue(payload: Value) -> Self {
        Self {
            catalogue: Ok(payload),
            text: Err(ServiceError::Unavailable("no generator".into())),
            calls: Rc::default(),
        }
    }

    pub fn failing_catalogue(err: ServiceError) -> Self {
        Self {
            catalogue: Err(err),
            text: Err(ServiceError::Unavailable("no generator".into())),
            calls: Rc::default(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            catalogue: Err(ServiceError::Unavailable("no catalogue".into())),
            text: Ok(text.to_string()),
            calls: Rc::default(),
        }
    }
}

impl TemplateService for ScriptedService {
    fn list_templates(&self) -> Result<Value, ServiceError> {
        self.catalogue.clone()
    }

    fn generate(&self, _template_id: &str, _fields: &[(String, String)]) -> Result<String, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        self.text.clone()
    }
}

/// Built-in Helvetica backend that records how often layout measured text.
pub struct CountingBackend {
    inner: PdfBackend,
    pub measured: Rc<Cell<usize>>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            inner: PdfBackend::default(),
            measured: Rc::default(),
        }
    }
}

impl RenderBackend for CountingBackend {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        self.measured.set(self.measured.get() + 1);
        self.inner.text_width(text, style)
    }

    fn table(&self, request: &TableRequest, x: f32, y: f32, max_width: f32) -> Result<TableOp, Error> {
        self.inner.table(request, x, y, max_width)
    }

    fn render(&self, plan: &LayoutPlan) -> Result<Vec<u8>, Error> {
        self.inner.render(plan)
    }
}

/// Every character is `width` millimetres wide, whatever the style.
pub struct MonospaceBackend {
    pub width: f32,
}

impl RenderBackend for MonospaceBackend {
    fn text_width(&self, text: &str, _style: &TextStyle) -> f32 {
        text.chars().count() as f32 * self.width
    }

    fn table(&self, _request: &TableRequest, _x: f32, _y: f32, _max_width: f32) -> Result<TableOp, Error> {
        Err(Error::RenderBackendFailure("monospace backend draws no tables".into()))
    }

    fn render(&self, _plan: &LayoutPlan) -> Result<Vec<u8>, Error> {
        Err(Error::SerializationFailure("monospace backend cannot serialize".into()))
    }
}
