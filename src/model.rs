use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    ShortText,
    Date,
    LongText,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_kind")]
    pub kind: FieldKind,
}

fn default_kind() -> FieldKind {
    FieldKind::ShortText
}

impl FieldSpec {
    pub fn new(key: &str, label: &str, placeholder: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            placeholder: placeholder.to_string(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TemplateDescriptor {
    pub id: String,
    pub display_name: String,
    pub fields: Vec<FieldSpec>,
}

/// User-entered values keyed by `FieldSpec::key`. Insertion order is kept
/// because it decides the order parties appear on the cover page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilledFields {
    entries: Vec<(String, String)>,
}

impl FilledFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilledFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FilledFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Signature,
    Body,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Hard line breaks inside the chunk (list items, signature rows).
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim_end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub margin_mm: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        margin_mm: 20.0,
        page_width_mm: 210.0,
        page_height_mm: 297.0,
    };

    pub fn usable_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartyEntry {
    pub role_label: String,
    pub name: String,
}

const PARTY_ROLES: [&str; 8] = [
    "partner", "party", "employer", "employee", "landlord", "tenant", "seller", "buyer",
];

/// Fields whose key names a party role, in field order, empty values dropped.
pub fn parties_from_fields(fields: &FilledFields) -> Vec<PartyEntry> {
    fields
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            PARTY_ROLES.iter().any(|role| key.contains(role))
        })
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| PartyEntry {
            role_label: key.to_string(),
            name: value.trim().to_string(),
        })
        .collect()
}
