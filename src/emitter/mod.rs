pub mod ntriples;
pub mod turtle;

/// Trait for emitting RDF triples in different serialization formats.
pub trait TriplesEmitter {
    /// Emit a triple with an IRI object.
    fn emit_iri(&mut self, subject: &str, predicate: &str, object: &str);
    /// Emit a triple with a plain string literal object.
    fn emit_literal(&mut self, subject: &str, predicate: &str, value: &str);
    /// Emit a triple with a language-tagged literal object.
    fn emit_lang_literal(&mut self, subject: &str, predicate: &str, value: &str, lang: &str);
    /// Register a namespace prefix (used by Turtle format).
    fn add_prefix(&mut self, prefix: &str, iri: &str);
    /// Flush any buffered output.
    fn flush(&mut self) -> std::io::Result<()>;
    /// Return the number of triples emitted so far.
    fn triple_count(&self) -> u64;
}
