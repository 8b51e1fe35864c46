//! Generation pipeline: validate fields, obtain prose from the text service,
//! and turn it into a decorated plan or an output file.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{FieldKind, FilledFields, TemplateDescriptor};
use crate::pdf::{PdfBackend, RenderBackend};
use crate::plan::LayoutPlan;
use crate::service::TemplateService;
use crate::style::LayoutStyle;
use crate::templates::TemplateRegistry;

/// Opaque reference to one generated document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct GeneratedDocument {
    template_id: String,
    fields: FilledFields,
    text: String,
}

pub struct DocumentGenerator<S: TemplateService> {
    registry: TemplateRegistry,
    service: S,
    style: LayoutStyle,
    backend: Box<dyn RenderBackend>,
    effective_date: Option<String>,
    documents: HashMap<u64, GeneratedDocument>,
    next_id: u64,
}

impl<S: TemplateService> DocumentGenerator<S> {
    pub fn new(registry: TemplateRegistry, service: S, style: LayoutStyle) -> Self {
        let backend = Box::new(PdfBackend::new(&style));
        Self {
            registry,
            service,
            style,
            backend,
            effective_date: None,
            documents: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Date shown on the cover when no field supplies one.
    pub fn with_effective_date(mut self, date: impl Into<String>) -> Self {
        self.effective_date = Some(date.into());
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Validate `fields` against the template and ask the service for prose.
    /// Nothing reaches the service unless every required field is filled.
    pub fn generate(&mut self, template_id: &str, fields: &[(String, String)]) -> Result<DocumentHandle, Error> {
        let template = self.registry.template(template_id)?;
        let filled: FilledFields = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        if let Some(missing) = template
            .fields
            .iter()
            .find(|spec| filled.get(&spec.key).is_none_or(|v| v.trim().is_empty()))
        {
            return Err(Error::MissingField {
                key: missing.key.clone(),
                label: missing.label.clone(),
            });
        }

        let ordered = template_order(template, &filled);
        log::info!(
            "Requesting '{}' with {} fields from the text service",
            template_id,
            ordered.len()
        );
        let text = self.service.generate(template_id, &ordered)?;

        let handle = DocumentHandle(self.next_id);
        self.next_id += 1;
        self.documents.insert(
            handle.0,
            GeneratedDocument {
                template_id: template_id.to_string(),
                fields: filled,
                text,
            },
        );
        log::debug!("Stored generated text as document #{}", handle.0);
        Ok(handle)
    }

    fn document(&self, handle: DocumentHandle) -> Result<&GeneratedDocument, Error> {
        self.documents
            .get(&handle.0)
            .ok_or(Error::UnknownDocument(handle.0))
    }

    /// The generated text, rejected when it is not fit for layout.
    pub fn fetch_document_text(&self, handle: DocumentHandle) -> Result<&str, Error> {
        let doc = self.document(handle)?;
        check_complete(&doc.text)?;
        Ok(&doc.text)
    }

    pub fn compose(&self, handle: DocumentHandle) -> Result<LayoutPlan, Error> {
        let text = self.fetch_document_text(handle)?;
        let doc = self.document(handle)?;
        let template = self.registry.template(&doc.template_id)?;
        let date = self.effective_date_for(template, &doc.fields);
        Ok(crate::compose(
            text,
            template,
            &doc.fields,
            &date,
            &self.style,
            self.backend.as_ref(),
        ))
    }

    pub fn render_pdf(&self, handle: DocumentHandle) -> Result<Vec<u8>, Error> {
        let plan = self.compose(handle)?;
        self.backend.render(&plan)
    }

    /// Plain-text export: exactly what the classifier was fed.
    pub fn export_text(&self, handle: DocumentHandle) -> Result<String, Error> {
        self.fetch_document_text(handle).map(str::to_string)
    }

    /// `<templateId>_Agreement.<ext>`
    pub fn file_name(&self, handle: DocumentHandle, ext: &str) -> Result<String, Error> {
        let doc = self.document(handle)?;
        Ok(format!("{}_Agreement.{}", doc.template_id, ext))
    }

    pub fn write_pdf(&self, handle: DocumentHandle, dir: &Path) -> Result<PathBuf, Error> {
        let bytes = self.render_pdf(handle)?;
        let path = dir.join(self.file_name(handle, "pdf")?);
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    pub fn write_text(&self, handle: DocumentHandle, dir: &Path) -> Result<PathBuf, Error> {
        let text = self.export_text(handle)?;
        let path = dir.join(self.file_name(handle, "txt")?);
        write_atomic(&path, text.as_bytes())?;
        Ok(path)
    }

    fn effective_date_for(&self, template: &TemplateDescriptor, fields: &FilledFields) -> String {
        let from_field = template
            .fields
            .iter()
            .filter(|spec| spec.kind == FieldKind::Date)
            .filter(|spec| {
                let key = spec.key.to_lowercase();
                key.contains("effective") || key.contains("start")
            })
            .find_map(|spec| fields.get(&spec.key).map(str::trim).filter(|v| !v.is_empty()));

        match (from_field, &self.effective_date) {
            (Some(date), _) => date.to_string(),
            (None, Some(date)) => date.clone(),
            (None, None) => chrono::Local::now().format("%B %-d, %Y").to_string(),
        }
    }
}

/// Template fields first in template order, then anything extra the caller sent.
fn template_order(template: &TemplateDescriptor, filled: &FilledFields) -> Vec<(String, String)> {
    let mut ordered: Vec<(String, String)> = template
        .fields
        .iter()
        .filter_map(|spec| filled.get(&spec.key).map(|v| (spec.key.clone(), v.to_string())))
        .collect();
    for (key, value) in filled.iter() {
        if !template.fields.iter().any(|spec| spec.key == key) {
            ordered.push((key.to_string(), value.to_string()));
        }
    }
    ordered
}

/// Reject text that must not be paginated: empty output, the word `Error`,
/// or a placeholder the service left unresolved (`{{name}}`, `${name}`,
/// `[PARTY_NAME]`).
pub fn check_complete(text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::IncompleteGeneration("generated text is empty".into()));
    }
    if text.contains("Error") {
        return Err(Error::IncompleteGeneration(
            "generated text reports an error".into(),
        ));
    }
    if let Some(marker) = unresolved_placeholder(text) {
        return Err(Error::IncompleteGeneration(format!(
            "unresolved placeholder {marker}"
        )));
    }
    Ok(())
}

fn unresolved_placeholder(text: &str) -> Option<&str> {
    if let Some(start) = text.find("{{") {
        let end = text[start..].find("}}").map_or(text.len(), |e| start + e + 2);
        return Some(&text[start..end]);
    }
    if let Some(start) = text.find("${") {
        let end = text[start..].find('}').map_or(text.len(), |e| start + e + 1);
        return Some(&text[start..end]);
    }

    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let inner = &after[..close];
        if is_placeholder_name(inner) {
            let start = offset + open;
            return Some(&text[start..start + close + 2]);
        }
        offset += open + 1;
        rest = after;
    }
    None
}

fn is_placeholder_name(inner: &str) -> bool {
    inner.chars().any(|c| c.is_ascii_uppercase())
        && inner
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == ' ')
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let fail = |e: std::io::Error| Error::SerializationFailure(format!("{}: {}", path.display(), e));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;

    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
