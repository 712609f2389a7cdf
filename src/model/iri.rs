//! Slug and IRI minting for wiki entities.

use deunicode::deunicode;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use super::ontology::{EntityType, Relation};
use crate::html;

/// Characters that need percent-encoding in a wiki page path segment.
/// We keep alphanumeric, -, _, ., ~ and / as unreserved per RFC 3987
/// (slashes occur in subpage titles and must survive).
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Derive the stable node identifier from a display title.
///
/// Normalization, in order: HTML entities decoded, surrounding whitespace
/// trimmed, Unicode-lowercased, transliterated to ASCII, runs of whitespace
/// and `/` folded to a single `_`, every remaining character outside
/// `[a-z0-9_-]` dropped. Titles differing only in case or whitespace yield
/// the same slug. An empty result falls back to `"entity"`.
pub fn slugify(title: &str) -> String {
    let decoded = html::decode_entities(title);
    let ascii = deunicode(decoded.trim().to_lowercase().as_str());
    let mut out = String::with_capacity(ascii.len());
    let mut last_us = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_us = false;
        } else if ch.is_whitespace() || ch == '/' || ch == '_' {
            if !last_us {
                out.push('_');
                last_us = true;
            }
        } else if ch == '-' {
            out.push('-');
            last_us = false;
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        "entity".to_string()
    } else {
        out
    }
}

/// Generates consistent IRIs for entities, classes and properties.
pub struct IriMinter {
    base_iri: String,
}

impl IriMinter {
    pub fn new(base_iri: &str) -> Self {
        let mut base_iri = base_iri.to_string();
        if !base_iri.ends_with('#') && !base_iri.ends_with('/') {
            base_iri.push('#');
        }
        Self { base_iri }
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    /// IRI for an entity node, from its slug.
    pub fn entity_iri(&self, slug: &str) -> String {
        format!("{}{}", self.base_iri, slug)
    }

    /// IRI for a taxonomy class.
    pub fn class_iri(&self, ty: EntityType) -> String {
        format!("{}{}", self.base_iri, ty.local_name())
    }

    /// IRI for an object property.
    pub fn property_iri(&self, relation: Relation) -> String {
        format!("{}{}", self.base_iri, relation.local_name())
    }

    /// Strip the namespace off an IRI minted by this minter.
    pub fn local_name<'a>(&self, iri: &'a str) -> Option<&'a str> {
        iri.strip_prefix(self.base_iri.as_str())
    }
}

/// Build the article URL for a wiki page title.
///
/// Spaces become underscores, the rest of the title is percent-encoded as a
/// path segment the way the wiki itself links articles.
pub fn page_url(wiki_base: &str, title: &str) -> String {
    let name = title.trim().replace(' ', "_");
    let encoded = utf8_percent_encode(&name, PATH_ENCODE_SET).to_string();
    if wiki_base.ends_with('/') {
        format!("{wiki_base}{encoded}")
    } else {
        format!("{wiki_base}/{encoded}")
    }
}
