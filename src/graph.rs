//! In-memory triple store with checkpointed snapshots.
//!
//! Nodes, labels and edges live in sorted collections so every snapshot is
//! deterministic and diffable. Mutating operations are idempotent set
//! inserts; a counter of content mutations drives periodic checkpointing.
//! Serialization runs fully in memory before the snapshot file is
//! overwritten, so a failed write never corrupts the previous good file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::emitter::ntriples::NTriplesEmitter;
use crate::emitter::turtle::TurtleEmitter;
use crate::emitter::TriplesEmitter;
use crate::error::StoreError;
use crate::html::{decode_entities, normalize_ws};
use crate::model::iri::{slugify, IriMinter};
use crate::model::ontology::{choose_most_specific, standard, EntityType, Relation};

/// Snapshot serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Turtle,
    NTriples,
}

impl SnapshotFormat {
    pub fn from_name(name: &str) -> Option<SnapshotFormat> {
        match name.to_lowercase().as_str() {
            "turtle" | "ttl" => Some(SnapshotFormat::Turtle),
            "ntriples" | "nt" => Some(SnapshotFormat::NTriples),
            _ => None,
        }
    }
}

/// Construction parameters for a [`GraphStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub base_iri: String,
    pub language: String,
    pub output: PathBuf,
    pub format: SnapshotFormat,
    pub checkpoint_every: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            base_iri: "http://www.semanticweb.org/ontologies/harry_potter#".into(),
            language: "ru".into(),
            output: PathBuf::from("graph.ttl"),
            format: SnapshotFormat::Turtle,
            checkpoint_every: 120,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    labels: BTreeSet<String>,
    types: BTreeSet<EntityType>,
    comment: Option<String>,
}

/// The entity graph: typed nodes, labels and relation edges.
pub struct GraphStore {
    iris: IriMinter,
    opts: StoreOptions,
    nodes: BTreeMap<String, NodeRecord>,
    edges: BTreeSet<(String, Relation, String)>,
    pending: u64,
}

impl GraphStore {
    pub fn new(opts: StoreOptions) -> Self {
        Self {
            iris: IriMinter::new(&opts.base_iri),
            opts,
            nodes: BTreeMap::new(),
            edges: BTreeSet::new(),
            pending: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Mutations accumulated since the last successful save.
    pub fn pending_mutations(&self) -> u64 {
        self.pending
    }

    /// The most specific type asserted for a node, if any.
    pub fn node_type(&self, id: &str) -> Option<EntityType> {
        let record = self.nodes.get(id)?;
        if record.types.is_empty() {
            return None;
        }
        let types: Vec<EntityType> = record.types.iter().copied().collect();
        Some(choose_most_specific(&types))
    }

    /// All type assertions recorded for a node.
    pub fn node_types(&self, id: &str) -> Vec<EntityType> {
        self.nodes
            .get(id)
            .map(|r| r.types.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All edges, in sorted order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, Relation, &str)> {
        self.edges
            .iter()
            .map(|(s, r, o)| (s.as_str(), *r, o.as_str()))
    }

    pub fn node_labels(&self, id: &str) -> Vec<String> {
        self.nodes
            .get(id)
            .map(|r| r.labels.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Insert the node for a title with a type assertion and label.
    ///
    /// Repeating the call with the same title and type changes nothing.
    /// A differing type accumulates as an extra assertion -- tolerated, but
    /// a sign the classifier saw the entity twice with different evidence.
    pub fn ensure_node(&mut self, title: &str, ty: EntityType) -> String {
        let id = slugify(title);
        let label = normalize_ws(&decode_entities(title));
        let record = self.nodes.entry(id.clone()).or_default();
        let had_type = !record.types.is_empty();
        if record.types.insert(ty) {
            self.pending += 1;
            if had_type {
                warn!(node = %id, ty = ty.local_name(), "additional type assertion");
            } else {
                info!("{} <- {} ({})", ty.local_name(), label, id);
            }
        }
        if record.labels.insert(label) {
            self.pending += 1;
        }
        id
    }

    /// Insert a relation triple; a duplicate is a no-op (set semantics).
    /// Both endpoints must already exist as nodes.
    pub fn add_edge(&mut self, subject: &str, relation: Relation, object: &str) -> bool {
        debug_assert!(self.nodes.contains_key(subject) && self.nodes.contains_key(object));
        let inserted = self
            .edges
            .insert((subject.to_string(), relation, object.to_string()));
        if inserted {
            debug!("{} {} {}", subject, relation.local_name(), object);
            self.pending += 1;
        }
        inserted
    }

    /// Attach a comment literal to a node; the first comment wins.
    pub fn set_comment(&mut self, id: &str, text: &str) {
        if let Some(record) = self.nodes.get_mut(id) {
            if record.comment.is_none() {
                record.comment = Some(normalize_ws(text));
                self.pending += 1;
            }
        }
    }

    /// Save when the mutation counter has reached the configured interval,
    /// or unconditionally when `force` is set. Returns the triple count of
    /// the written snapshot, or `None` when no save was due.
    pub fn checkpoint(&mut self, force: bool) -> Result<Option<u64>, StoreError> {
        if !force && self.pending < self.opts.checkpoint_every {
            return Ok(None);
        }
        let triples = self.save()?;
        info!(
            "saved {} ({} triples, {} nodes, {} edges)",
            self.opts.output.display(),
            triples,
            self.nodes.len(),
            self.edges.len()
        );
        self.pending = 0;
        Ok(Some(triples))
    }

    /// Serialize the full graph and overwrite the snapshot file.
    pub fn save(&self) -> Result<u64, StoreError> {
        let mut buf = Vec::new();
        let triples = match self.opts.format {
            SnapshotFormat::Turtle => {
                let mut emitter = TurtleEmitter::new(&mut buf);
                self.serialize(&mut emitter);
                emitter.flush()?;
                emitter.triple_count()
            }
            SnapshotFormat::NTriples => {
                let mut emitter = NTriplesEmitter::new(&mut buf);
                self.serialize(&mut emitter);
                emitter.flush()?;
                emitter.triple_count()
            }
        };
        fs::write(&self.opts.output, &buf)?;
        Ok(triples)
    }

    /// Emit the whole graph: prefixes, class and property declarations,
    /// node assertions, then edges.
    pub fn serialize<E: TriplesEmitter>(&self, emitter: &mut E) {
        emitter.add_prefix("hp", self.iris.base_iri());
        emitter.add_prefix("rdf", standard::RDF);
        emitter.add_prefix("rdfs", standard::RDFS);
        emitter.add_prefix("owl", standard::OWL);

        for ty in EntityType::ALL {
            let class_iri = self.iris.class_iri(*ty);
            emitter.emit_iri(&class_iri, standard::RDF_TYPE, standard::OWL_CLASS);
            if let Some(parent) = ty.parent() {
                emitter.emit_iri(
                    &class_iri,
                    standard::RDFS_SUBCLASS_OF,
                    &self.iris.class_iri(parent),
                );
            }
        }
        for relation in Relation::ALL {
            emitter.emit_iri(
                &self.iris.property_iri(*relation),
                standard::RDF_TYPE,
                standard::OWL_OBJECT_PROPERTY,
            );
        }

        for (id, record) in &self.nodes {
            let subject = self.iris.entity_iri(id);
            for ty in &record.types {
                emitter.emit_iri(&subject, standard::RDF_TYPE, &self.iris.class_iri(*ty));
            }
            for label in &record.labels {
                emitter.emit_lang_literal(
                    &subject,
                    standard::RDFS_LABEL,
                    label,
                    &self.opts.language,
                );
            }
            if let Some(comment) = &record.comment {
                emitter.emit_lang_literal(
                    &subject,
                    standard::RDFS_COMMENT,
                    comment,
                    &self.opts.language,
                );
            }
        }

        for (subject, relation, object) in &self.edges {
            emitter.emit_iri(
                &self.iris.entity_iri(subject),
                &self.iris.property_iri(*relation),
                &self.iris.entity_iri(object),
            );
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot loading
    // -----------------------------------------------------------------------

    /// Re-read a snapshot previously written by [`save`](Self::save).
    ///
    /// Only this crate's canonical output is understood: ontology
    /// declarations are re-derived rather than read, and triples outside the
    /// known vocabulary are skipped with a debug log. Structurally broken
    /// lines fail the load.
    pub fn load(path: &Path, opts: StoreOptions) -> Result<GraphStore, StoreError> {
        let content = fs::read_to_string(path)?;
        let mut store = GraphStore::new(opts);
        let mut prefixes: BTreeMap<String, String> = BTreeMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            let lineno = idx + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("@prefix") {
                let (prefix, iri) = parse_prefix(rest).ok_or_else(|| StoreError::Malformed {
                    line: lineno,
                    message: "bad @prefix declaration".into(),
                })?;
                prefixes.insert(prefix, iri);
                continue;
            }
            let (subject_tok, rest) = split_token(line).ok_or_else(|| StoreError::Malformed {
                line: lineno,
                message: "missing subject".into(),
            })?;
            let (predicate_tok, rest) = split_token(rest).ok_or_else(|| StoreError::Malformed {
                line: lineno,
                message: "missing predicate".into(),
            })?;
            let object_tok = rest
                .trim()
                .strip_suffix('.')
                .map(str::trim_end)
                .ok_or_else(|| StoreError::Malformed {
                    line: lineno,
                    message: "missing terminating dot".into(),
                })?;

            let subject = expand(subject_tok, &prefixes, lineno)?;
            let predicate = expand(predicate_tok, &prefixes, lineno)?;

            if let Some((value, _lang)) = parse_literal(object_tok) {
                let Some(slug) = store.iris.local_name(&subject).map(str::to_string) else {
                    debug!(line = lineno, "skipping literal for foreign subject");
                    continue;
                };
                let record = store.nodes.entry(slug).or_default();
                match predicate.as_str() {
                    standard::RDFS_LABEL => {
                        record.labels.insert(value);
                    }
                    standard::RDFS_COMMENT => {
                        record.comment.get_or_insert(value);
                    }
                    _ => debug!(line = lineno, "skipping unknown literal predicate"),
                }
                continue;
            }

            let object = expand(object_tok, &prefixes, lineno)?;
            if predicate == standard::RDF_TYPE {
                if object == standard::OWL_CLASS || object == standard::OWL_OBJECT_PROPERTY {
                    continue; // ontology declaration, re-derived on save
                }
                let (Some(slug), Some(class_local)) = (
                    store.iris.local_name(&subject).map(str::to_string),
                    store.iris.local_name(&object),
                ) else {
                    debug!(line = lineno, "skipping foreign type triple");
                    continue;
                };
                match EntityType::from_local_name(class_local) {
                    Some(ty) => {
                        store.nodes.entry(slug).or_default().types.insert(ty);
                    }
                    None => debug!(line = lineno, "skipping unknown class {class_local}"),
                }
                continue;
            }
            if predicate == standard::RDFS_SUBCLASS_OF {
                continue; // ontology declaration
            }
            let (Some(subject_slug), Some(predicate_local), Some(object_slug)) = (
                store.iris.local_name(&subject).map(str::to_string),
                store.iris.local_name(&predicate).map(str::to_string),
                store.iris.local_name(&object).map(str::to_string),
            ) else {
                debug!(line = lineno, "skipping foreign triple");
                continue;
            };
            match Relation::from_local_name(&predicate_local) {
                Some(relation) => {
                    store.edges.insert((subject_slug, relation, object_slug));
                }
                None => debug!(line = lineno, "skipping unknown relation {predicate_local}"),
            }
        }

        store.pending = 0;
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Snapshot parsing helpers
// ---------------------------------------------------------------------------

fn parse_prefix(rest: &str) -> Option<(String, String)> {
    // rest looks like: ` hp: <http://...#> .`
    let rest = rest.trim();
    let colon = rest.find(':')?;
    let prefix = rest[..colon].trim().to_string();
    let open = rest.find('<')?;
    let close = rest.find('>')?;
    if close <= open {
        return None;
    }
    Some((prefix, rest[open + 1..close].to_string()))
}

fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(pos) => Some((&s[..pos], &s[pos..])),
        None => Some((s, "")),
    }
}

/// Expand a `<iri>` or `prefix:local` token to a full IRI.
fn expand(
    token: &str,
    prefixes: &BTreeMap<String, String>,
    lineno: usize,
) -> Result<String, StoreError> {
    if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(inner.to_string());
    }
    let colon = token.find(':').ok_or_else(|| StoreError::Malformed {
        line: lineno,
        message: format!("not an IRI token: {token}"),
    })?;
    let (prefix, local) = (&token[..colon], &token[colon + 1..]);
    let ns = prefixes.get(prefix).ok_or_else(|| StoreError::Malformed {
        line: lineno,
        message: format!("unknown prefix {prefix:?}"),
    })?;
    Ok(format!("{ns}{local}"))
}

/// Parse a `"value"` or `"value"@lang` object token.
fn parse_literal(token: &str) -> Option<(String, Option<String>)> {
    let rest = token.strip_prefix('"')?;
    // Find the closing quote, skipping escaped characters.
    let mut end = None;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            end = Some(i);
            break;
        }
    }
    let end = end?;
    let value = unescape(&rest[..end]);
    let lang = rest[end + 1..]
        .strip_prefix('@')
        .map(|l| l.trim().to_string());
    Some((value, lang))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => break,
        }
    }
    out
}
