//! Section Classifier: turns generated prose into ordered heading, signature
//! and body blocks.

use crate::model::{Block, BlockKind};

const SIGNATURE_MARKERS: [&str; 3] = ["Signature", "Printed Name", "Witness"];

const ROLE_TOKENS: [&str; 10] = [
    "Partner", "Party", "Employer", "Employee", "Landlord", "Tenant", "Seller", "Buyer",
    "Provider", "Client",
];

const ROLE_LINE_MAX_WORDS: usize = 6;

pub struct Rule {
    pub kind: BlockKind,
    pub matches: fn(&str) -> bool,
}

/// Evaluated top-down, first match wins. The order is part of the contract.
pub const RULES: [Rule; 3] = [
    Rule {
        kind: BlockKind::Heading,
        matches: is_heading,
    },
    Rule {
        kind: BlockKind::Signature,
        matches: is_signature,
    },
    Rule {
        kind: BlockKind::Body,
        matches: always,
    },
];

pub fn classify(text: &str) -> Vec<Block> {
    split_chunks(text)
        .into_iter()
        .map(|chunk| {
            let kind = classify_chunk(&chunk);
            let text = match kind {
                BlockKind::Heading => clean_heading(&chunk),
                _ => chunk,
            };
            Block { kind, text }
        })
        .collect()
}

pub fn classify_chunk(chunk: &str) -> BlockKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(chunk))
        .map(|rule| rule.kind)
        .unwrap_or(BlockKind::Body)
}

/// Split on blank lines (lines holding only whitespace count as blank) and
/// drop chunks that are empty after trimming.
fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn is_heading(chunk: &str) -> bool {
    let stripped = strip_emphasis(chunk);
    let stripped = stripped.trim();
    is_numbered_heading(stripped) || stripped.starts_with('#') || is_all_caps(stripped)
}

/// `<digits>. ` at the start of the chunk.
fn is_numbered_heading(s: &str) -> bool {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && s[digits..].starts_with(". ")
}

/// Needs at least one letter so rules like "_______" are not headings.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic()) && !s.chars().any(|c| c.is_lowercase())
}

fn is_signature(chunk: &str) -> bool {
    SIGNATURE_MARKERS.iter().any(|m| chunk.contains(m)) || chunk.lines().any(is_role_line)
}

/// A short caption line naming a role, e.g. "Disclosing Party   Receiving Party".
/// Captions are title-cased and carry no closing punctuation; a sentence that
/// mentions a party ("Each Party bears its own costs.") is not one.
fn is_role_line(line: &str) -> bool {
    let line = line.trim();
    if line.ends_with(['.', ':', ';', ',']) {
        return false;
    }
    let words: Vec<&str> = line
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    !words.is_empty()
        && words.len() <= ROLE_LINE_MAX_WORDS
        && words.iter().any(|w| ROLE_TOKENS.contains(w))
        && words.iter().all(|w| !w.starts_with(char::is_lowercase))
}

fn always(_: &str) -> bool {
    true
}

fn strip_emphasis(s: &str) -> String {
    s.replace("**", "")
}

fn clean_heading(chunk: &str) -> String {
    strip_emphasis(chunk)
        .trim()
        .trim_start_matches('#')
        .trim()
        .to_string()
}
