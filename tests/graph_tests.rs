use wiki2rdf::emitter::turtle::TurtleEmitter;
use wiki2rdf::graph::{GraphStore, SnapshotFormat, StoreOptions};
use wiki2rdf::model::ontology::{EntityType, Relation};

fn opts_at(dir: &tempfile::TempDir) -> StoreOptions {
    StoreOptions {
        base_iri: "http://example.org/hp#".into(),
        language: "ru".into(),
        output: dir.path().join("graph.ttl"),
        format: SnapshotFormat::Turtle,
        checkpoint_every: 5,
    }
}

fn serialize_to_string(store: &GraphStore) -> String {
    let mut buf = Vec::new();
    let mut emitter = TurtleEmitter::new(&mut buf);
    store.serialize(&mut emitter);
    String::from_utf8(buf).unwrap()
}

// --- ensure_node ---

#[test]
fn ensure_node_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new(opts_at(&dir));
    let id1 = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    let pending = store.pending_mutations();
    let id2 = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    assert_eq!(id1, id2);
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.pending_mutations(), pending, "repeat call must not mutate");

    let out = serialize_to_string(&store);
    let type_lines = out
        .lines()
        .filter(|l| l.starts_with(&format!("hp:{id1} rdf:type")))
        .count();
    let label_lines = out
        .lines()
        .filter(|l| l.starts_with(&format!("hp:{id1} rdfs:label")))
        .count();
    assert_eq!(type_lines, 1, "exactly one type assertion");
    assert_eq!(label_lines, 1, "exactly one label triple");
}

#[test]
fn case_variant_titles_collapse_to_one_node() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new(opts_at(&dir));
    let a = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    let b = store.ensure_node(" гарри   поттер ", EntityType::Wizard);
    assert_eq!(a, b);
    assert_eq!(store.node_count(), 1);
}

#[test]
fn differing_type_accumulates_as_second_assertion() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new(opts_at(&dir));
    let id = store.ensure_node("Флоренц", EntityType::Character);
    store.ensure_node("Флоренц", EntityType::Centaur);
    let types = store.node_types(&id);
    assert_eq!(types.len(), 2);
    // The most specific assertion wins for lookups
    assert_eq!(store.node_type(&id), Some(EntityType::Centaur));
}

// --- add_edge ---

#[test]
fn edge_set_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new(opts_at(&dir));
    let harry = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    let ginny = store.ensure_node("Джинни Уизли", EntityType::Wizard);
    assert!(store.add_edge(&harry, Relation::MarriedWith, &ginny));
    assert!(!store.add_edge(&harry, Relation::MarriedWith, &ginny));
    assert_eq!(store.edge_count(), 1);
    // A different relation between the same pair is a different triple
    assert!(store.add_edge(&harry, Relation::RomanceWith, &ginny));
    assert_eq!(store.edge_count(), 2);
}

// --- checkpointing ---

#[test]
fn checkpoint_triggers_at_interval_and_resets_counter() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_at(&dir);
    let output = opts.output.clone();
    let mut store = GraphStore::new(opts);

    // ensure_node adds a type assertion and a label: 2 mutations
    store.ensure_node("Гриффиндор", EntityType::House);
    assert!(store.checkpoint(false).unwrap().is_none(), "below threshold");
    assert!(!output.exists());

    store.ensure_node("Слизерин", EntityType::House);
    store.ensure_node("Когтевран", EntityType::House);
    assert!(store.pending_mutations() >= 5);
    assert!(store.checkpoint(false).unwrap().is_some(), "threshold reached");
    assert!(output.exists());
    assert_eq!(store.pending_mutations(), 0, "counter resets after save");
}

#[test]
fn forced_checkpoint_always_saves() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_at(&dir);
    let output = opts.output.clone();
    let mut store = GraphStore::new(opts);
    store.ensure_node("Хогвартс", EntityType::Location);
    let triples = store.checkpoint(true).unwrap().expect("forced save");
    assert!(triples > 0);
    assert!(output.exists());
    assert_eq!(store.pending_mutations(), 0);
}

#[test]
fn snapshot_declares_ontology() {
    let dir = tempfile::tempdir().unwrap();
    let store = GraphStore::new(opts_at(&dir));
    let out = serialize_to_string(&store);
    assert!(out.contains("@prefix hp: <http://example.org/hp#> ."));
    assert!(out.contains("hp:Wizard rdf:type owl:Class ."));
    assert!(out.contains("hp:Wizard rdfs:subClassOf hp:Human ."));
    assert!(out.contains("hp:House_elf rdfs:subClassOf hp:Magical_creature ."));
    assert!(out.contains("hp:marriedWith rdf:type owl:ObjectProperty ."));
}

#[test]
fn node_triples_are_language_tagged() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new(opts_at(&dir));
    let id = store.ensure_node("Гриффиндор", EntityType::House);
    let out = serialize_to_string(&store);
    assert!(out.contains(&format!("hp:{id} rdf:type hp:House .")));
    assert!(out.contains(&format!("hp:{id} rdfs:label \"Гриффиндор\"@ru .")));
}

// --- save/load round trip ---

#[test]
fn snapshot_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_at(&dir);
    let output = opts.output.clone();
    let mut store = GraphStore::new(opts.clone());
    let harry = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    let ginny = store.ensure_node("Джинни Уизли", EntityType::Wizard);
    let hogwarts = store.ensure_node("Хогвартс", EntityType::Location);
    store.add_edge(&harry, Relation::MarriedWith, &ginny);
    store.add_edge(&harry, Relation::StudiedAt, &hogwarts);
    store.set_comment(&harry, "мужской");
    store.save().unwrap();

    let loaded = GraphStore::load(&output, opts).unwrap();
    assert_eq!(loaded.node_count(), 3);
    assert_eq!(loaded.edge_count(), 2);
    assert_eq!(loaded.node_type(&harry), Some(EntityType::Wizard));
    assert_eq!(loaded.node_labels(&harry), vec!["Гарри Поттер".to_string()]);
    assert_eq!(loaded.pending_mutations(), 0);

    // Loading then saving again reproduces the same snapshot
    assert_eq!(serialize_to_string(&store), serialize_to_string(&loaded));
}

#[test]
fn ntriples_snapshot_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = opts_at(&dir);
    opts.format = SnapshotFormat::NTriples;
    opts.output = dir.path().join("graph.nt");
    let output = opts.output.clone();
    let mut store = GraphStore::new(opts.clone());
    let harry = store.ensure_node("Гарри Поттер", EntityType::Wizard);
    let ron = store.ensure_node("Рон Уизли", EntityType::Wizard);
    store.add_edge(&harry, Relation::FriendWith, &ron);
    store.save().unwrap();

    let loaded = GraphStore::load(&output, opts).unwrap();
    assert_eq!(loaded.node_count(), 2);
    assert_eq!(loaded.edge_count(), 1);
    assert_eq!(loaded.node_type(&ron), Some(EntityType::Wizard));
}

#[test]
fn load_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_at(&dir);
    let path = dir.path().join("broken.ttl");
    std::fs::write(&path, "this is not a snapshot\n").unwrap();
    assert!(GraphStore::load(&path, opts).is_err());
}

#[test]
fn resumed_store_keeps_first_classification() {
    let dir = tempfile::tempdir().unwrap();
    let opts = opts_at(&dir);
    let output = opts.output.clone();
    let mut store = GraphStore::new(opts.clone());
    store.ensure_node("Гарри Поттер", EntityType::Wizard);
    store.save().unwrap();

    let mut resumed = GraphStore::load(&output, opts).unwrap();
    let id = resumed.ensure_node("Гарри Поттер", EntityType::Wizard);
    assert_eq!(resumed.node_types(&id).len(), 1);
    assert_eq!(resumed.pending_mutations(), 0, "re-assertion is a no-op");
}
