//! Infobox, category and text extraction from a parsed page.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::Vocabulary;
use crate::html::{Document, Fragment};

/// Canonical vocabulary for infobox fields. Raw labels vary by language and
/// synonym; the alias table folds them onto these keys at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Species,
    BloodStatus,
    Sex,
    House,
    Affiliation,
    School,
    Occupation,
    Spouse,
    Father,
    Mother,
    Friends,
    Romance,
    Relatives,
    Incantation,
    SpellType,
    Owners,
    Makers,
    PlaceName,
}

/// One infobox field value: either the titles of linked entities or the raw
/// cell text, never ambiguously both. Link anchors take priority; free text
/// is only split into candidates when no links were present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Links(Vec<String>),
    Text(String),
}

impl FieldValue {
    /// The value rendered as display text.
    pub fn text(&self) -> String {
        match self {
            FieldValue::Links(titles) => titles.join(", "),
            FieldValue::Text(t) => t.clone(),
        }
    }

    /// Candidate entity titles for relation linking.
    pub fn candidates(&self, and_words: &[String]) -> Vec<String> {
        match self {
            FieldValue::Links(titles) => titles
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            FieldValue::Text(t) => {
                let mut s = t.clone();
                for word in and_words {
                    s = s.replace(word.as_str(), ",");
                }
                s.split([',', ';', '/'])
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            }
        }
    }
}

/// The infobox as a canonical-field -> value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Infobox {
    fields: BTreeMap<CanonicalField, FieldValue>,
}

impl Infobox {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn value(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn text(&self, field: CanonicalField) -> Option<String> {
        self.fields.get(&field).map(FieldValue::text)
    }

    /// Merge a row into the mapping. Link values win over text values when
    /// two raw labels fold onto the same canonical key.
    fn insert(&mut self, field: CanonicalField, value: FieldValue) {
        match self.fields.entry(field) {
            Entry::Vacant(e) => {
                e.insert(value);
            }
            Entry::Occupied(mut e) => match (e.get_mut(), value) {
                (FieldValue::Links(have), FieldValue::Links(more)) => have.extend(more),
                (FieldValue::Text(_), links @ FieldValue::Links(_)) => {
                    e.insert(links);
                }
                _ => {}
            },
        }
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone)]
pub struct PageData {
    /// `None` means the page has no infobox at all -- a distinct signal:
    /// such pages are not treated as entity pages.
    pub infobox: Option<Infobox>,
    /// Categories attached to this article's header block.
    pub categories: BTreeSet<String>,
    /// Flattened page text.
    pub text: String,
}

/// Extract infobox fields, header categories and page text.
pub fn extract(doc: &Document, vocab: &Vocabulary) -> PageData {
    PageData {
        infobox: doc
            .fragment("portable-infobox")
            .map(|f| extract_infobox(&f, vocab)),
        categories: extract_categories(doc, &vocab.category_prefix),
        text: doc.text(),
    }
}

fn extract_infobox(infobox: &Fragment<'_>, vocab: &Vocabulary) -> Infobox {
    let mut out = Infobox::default();
    for row in infobox.fragments("pi-data") {
        let Some(label) = row.fragment("pi-data-label") else {
            continue;
        };
        let Some(value) = row.fragment("pi-data-value") else {
            continue;
        };
        let key = label.text().to_lowercase();
        let Some(field) = vocab.field_aliases.get(key.trim()) else {
            continue;
        };
        let links: Vec<String> = value
            .anchors()
            .into_iter()
            .filter(|a| a.href.contains("/wiki/") && !a.href.starts_with('#'))
            .filter_map(|a| {
                let title = a.title.unwrap_or(a.text);
                let title = title.trim();
                if title.is_empty() || title.starts_with(vocab.category_prefix.as_str()) {
                    None
                } else {
                    Some(title.to_string())
                }
            })
            .collect();
        let value = if links.is_empty() {
            FieldValue::Text(value.text())
        } else {
            FieldValue::Links(links)
        };
        out.insert(*field, value);
    }
    out
}

/// Categories from the page-header block only. A full-page scan would pick
/// up navigation templates and corrupt classification.
fn extract_categories(doc: &Document, prefix: &str) -> BTreeSet<String> {
    let mut cats = BTreeSet::new();
    let mut blocks = Vec::new();
    if let Some(f) = doc.fragment("page-header__categories") {
        blocks.push(f);
    }
    if let Some(f) = doc.fragment_by_id("articleCategories") {
        blocks.push(f);
    }
    for block in blocks {
        for anchor in block.anchors() {
            let label = anchor.title.as_deref().unwrap_or(anchor.text.as_str());
            if let Some(name) = label.trim().strip_prefix(prefix) {
                let name = name.trim();
                if !name.is_empty() {
                    cats.insert(name.to_string());
                }
            }
        }
    }
    cats
}
