//! Field Schema Registry: which document kinds exist and which fields each
//! one needs before generation may start.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::model::{FieldKind, FieldSpec, TemplateDescriptor};
use crate::service::{ServiceError, TemplateService};

/// Where the loaded template list came from.
pub trait TemplateSource {
    fn name(&self) -> &'static str;

    fn templates(&self) -> &[TemplateDescriptor];
}

pub struct BuiltinTemplateSource {
    templates: Vec<TemplateDescriptor>,
}

impl BuiltinTemplateSource {
    pub fn new() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }
}

impl Default for BuiltinTemplateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSource for BuiltinTemplateSource {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }
}

pub struct RemoteTemplateSource {
    templates: Vec<TemplateDescriptor>,
}

#[derive(Deserialize)]
struct RemoteEntry {
    id: String,
    name: String,
    #[serde(default)]
    fields: Option<Vec<FieldSpec>>,
}

impl RemoteTemplateSource {
    /// Fetch and validate the remote catalogue. Any shape problem rejects the
    /// whole list rather than keeping the well-formed part of it.
    pub fn fetch(service: &dyn TemplateService) -> Result<Self, ServiceError> {
        let payload = service.list_templates()?;
        let templates = parse_catalogue(payload)?;
        Ok(Self { templates })
    }
}

impl TemplateSource for RemoteTemplateSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }
}

fn parse_catalogue(payload: Value) -> Result<Vec<TemplateDescriptor>, ServiceError> {
    let Value::Array(items) = payload else {
        return Err(ServiceError::Malformed("template list is not an array".into()));
    };
    if items.is_empty() {
        return Err(ServiceError::Malformed("template list is empty".into()));
    }

    let builtins = builtin_templates();
    let mut seen_ids = HashSet::new();
    let mut templates = Vec::with_capacity(items.len());

    for (idx, item) in items.into_iter().enumerate() {
        let entry: RemoteEntry = serde_json::from_value(item)
            .map_err(|e| ServiceError::Malformed(format!("entry {idx}: {e}")))?;
        if entry.id.trim().is_empty() {
            return Err(ServiceError::Malformed(format!("entry {idx}: empty id")));
        }
        if !seen_ids.insert(entry.id.clone()) {
            return Err(ServiceError::Malformed(format!("duplicate template id '{}'", entry.id)));
        }

        let fields = match entry.fields {
            Some(fields) => fields,
            None => builtins
                .iter()
                .find(|t| t.id == entry.id)
                .map(|t| t.fields.clone())
                .unwrap_or_default(),
        };
        let mut keys = HashSet::new();
        if let Some(dup) = fields.iter().find(|f| !keys.insert(f.key.as_str())) {
            return Err(ServiceError::Malformed(format!(
                "template '{}' repeats field key '{}'",
                entry.id, dup.key
            )));
        }

        templates.push(TemplateDescriptor {
            id: entry.id,
            display_name: entry.name,
            fields,
        });
    }
    Ok(templates)
}

pub struct TemplateRegistry {
    source: Box<dyn TemplateSource>,
    selected: String,
}

impl TemplateRegistry {
    /// Try the remote catalogue once; fall back to the built-in set when it
    /// is unreachable, unauthenticated, empty or malformed.
    pub fn load(service: &dyn TemplateService, selected: Option<&str>) -> Self {
        let source: Box<dyn TemplateSource> = match RemoteTemplateSource::fetch(service) {
            Ok(remote) => Box::new(remote),
            Err(e) => {
                log::warn!("Template catalogue unavailable ({e}), using built-in templates");
                Box::new(BuiltinTemplateSource::new())
            }
        };
        Self::with_source(source, selected)
    }

    pub fn builtin() -> Self {
        Self::with_source(Box::new(BuiltinTemplateSource::new()), None)
    }

    pub fn with_source(source: Box<dyn TemplateSource>, selected: Option<&str>) -> Self {
        let first = source
            .templates()
            .first()
            .map(|t| t.id.clone())
            .unwrap_or_default();
        let selected = match selected {
            Some(id) if source.templates().iter().any(|t| t.id == id) => id.to_string(),
            Some(id) => {
                log::debug!("Selected template '{id}' not loaded, resetting to '{first}'");
                first
            }
            None => first,
        };
        log::debug!(
            "Loaded {} templates from {} source",
            source.templates().len(),
            source.name()
        );
        Self { source, selected }
    }

    pub fn source(&self) -> &'static str {
        self.source.name()
    }

    pub fn list_templates(&self) -> &[TemplateDescriptor] {
        self.source.templates()
    }

    pub fn template(&self, id: &str) -> Result<&TemplateDescriptor, Error> {
        self.source
            .templates()
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::UnknownTemplate(id.to_string()))
    }

    pub fn fields_for(&self, id: &str) -> Result<&[FieldSpec], Error> {
        self.template(id).map(|t| t.fields.as_slice())
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn select(&mut self, id: &str) -> Result<(), Error> {
        self.template(id)?;
        self.selected = id.to_string();
        Ok(())
    }
}

fn field(key: &str, label: &str, placeholder: &str, kind: FieldKind) -> FieldSpec {
    FieldSpec::new(key, label, placeholder, kind)
}

fn duration() -> FieldSpec {
    field("duration", "Duration", "e.g., 2 years", FieldKind::ShortText)
}

fn jurisdiction() -> FieldSpec {
    field("jurisdiction", "Jurisdiction", "e.g., California", FieldKind::ShortText)
}

/// The fixed catalogue used whenever the remote one cannot be trusted.
/// `duration` and `jurisdiction` keys are shared across kinds on purpose, but
/// every list is spelled out on its own.
pub fn builtin_templates() -> Vec<TemplateDescriptor> {
    use FieldKind::{Date, LongText, ShortText};

    let t = |id: &str, name: &str, fields: Vec<FieldSpec>| TemplateDescriptor {
        id: id.to_string(),
        display_name: name.to_string(),
        fields,
    };

    vec![
        t(
            "NDA",
            "Non-Disclosure Agreement",
            vec![
                field("disclosingParty", "Disclosing Party", "Enter disclosing party name", ShortText),
                field("receivingParty", "Receiving Party", "Enter receiving party name", ShortText),
                field("purpose", "Purpose", "e.g., Business collaboration", LongText),
                duration(),
                jurisdiction(),
            ],
        ),
        t(
            "Employment",
            "Employment Contract",
            vec![
                field("employerName", "Employer", "Enter employer name", ShortText),
                field("employeeName", "Employee", "Enter employee name", ShortText),
                field("position", "Position", "e.g., Software Engineer", ShortText),
                field("salary", "Salary", "e.g., $85,000 per year", ShortText),
                field("startDate", "Start Date", "e.g., 2025-01-15", Date),
                jurisdiction(),
            ],
        ),
        t(
            "Service",
            "Service Agreement",
            vec![
                field("providerParty", "Service Provider", "Enter service provider name", ShortText),
                field("clientParty", "Client", "Enter client name", ShortText),
                field("services", "Services", "Describe the services to be provided", LongText),
                field("compensation", "Compensation", "e.g., $5,000 per month", ShortText),
                duration(),
                jurisdiction(),
            ],
        ),
        t(
            "Partnership",
            "Partnership Agreement",
            vec![
                field("partner1", "First Partner", "Enter first partner name", ShortText),
                field("partner2", "Second Partner", "Enter second partner name", ShortText),
                field("businessName", "Business Name", "Enter partnership business name", ShortText),
                field("profitSharing", "Profit Sharing", "e.g., 50/50", ShortText),
                field("effectiveDate", "Effective Date", "e.g., 2025-01-01", Date),
                jurisdiction(),
            ],
        ),
        t(
            "Rental",
            "Rental Agreement",
            vec![
                field("landlord", "Landlord", "Enter landlord name", ShortText),
                field("tenant", "Tenant", "Enter tenant name", ShortText),
                field("propertyAddress", "Property Address", "Enter the rental property address", LongText),
                field("monthlyRent", "Monthly Rent", "e.g., $1,500", ShortText),
                field("leaseStart", "Lease Start Date", "e.g., 2025-02-01", Date),
                duration(),
            ],
        ),
        t(
            "Purchase",
            "Purchase Agreement",
            vec![
                field("seller", "Seller", "Enter seller name", ShortText),
                field("buyer", "Buyer", "Enter buyer name", ShortText),
                field("itemDescription", "Item Description", "Describe the goods or property sold", LongText),
                field("purchasePrice", "Purchase Price", "e.g., $25,000", ShortText),
                field("deliveryDate", "Delivery Date", "e.g., 2025-03-01", Date),
                jurisdiction(),
            ],
        ),
    ]
}
