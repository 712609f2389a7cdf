use wiki2rdf::model::iri::{page_url, slugify, IriMinter};
use wiki2rdf::model::ontology::{EntityType, Relation};

const BASE: &str = "http://example.org/hp#";

// --- Slugs ---

#[test]
fn slug_is_deterministic() {
    assert_eq!(slugify("Гарри Поттер"), slugify("Гарри Поттер"));
}

#[test]
fn slug_folds_case_and_whitespace() {
    assert_eq!(slugify("Гарри Поттер"), slugify(" гарри   поттер "));
}

#[test]
fn slug_ascii_basic() {
    assert_eq!(slugify("Harry Potter"), "harry_potter");
}

#[test]
fn slug_is_uri_safe() {
    for title in ["Гарри Поттер", "Орден Феникса", "Супруг(а)", "Турнир Трёх Волшебников"] {
        let slug = slugify(title);
        assert!(
            slug.chars().all(|c| c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || c == '_'
                || c == '-'),
            "slug not URI-safe for {title:?}: {slug}"
        );
    }
}

#[test]
fn slug_transliterates_cyrillic() {
    let slug = slugify("Гарри");
    assert!(slug.is_ascii());
    assert!(!slug.is_empty());
}

#[test]
fn slug_folds_slashes_and_punctuation() {
    assert_eq!(slugify("Раса/вид"), slugify("раса вид"));
    // Punctuation disappears, words survive
    assert_eq!(slugify("Harry, Potter!"), "harry_potter");
}

#[test]
fn slug_empty_falls_back() {
    assert_eq!(slugify(""), "entity");
    assert_eq!(slugify("!!!"), "entity");
}

#[test]
fn slug_decodes_entities() {
    assert_eq!(slugify("Fred &amp; George"), slugify("Fred & George"));
}

// --- IRI minting ---

#[test]
fn entity_iri_basic() {
    let m = IriMinter::new(BASE);
    assert_eq!(
        m.entity_iri("harry_potter"),
        "http://example.org/hp#harry_potter"
    );
}

#[test]
fn base_without_separator_gets_hash() {
    let m = IriMinter::new("http://example.org/hp");
    assert_eq!(m.base_iri(), "http://example.org/hp#");
}

#[test]
fn class_iri_uses_local_name() {
    let m = IriMinter::new(BASE);
    assert_eq!(
        m.class_iri(EntityType::HouseElf),
        "http://example.org/hp#House_elf"
    );
    assert_eq!(m.class_iri(EntityType::Wizard), "http://example.org/hp#Wizard");
}

#[test]
fn property_iri_uses_local_name() {
    let m = IriMinter::new(BASE);
    assert_eq!(
        m.property_iri(Relation::MarriedWith),
        "http://example.org/hp#marriedWith"
    );
}

#[test]
fn local_name_round_trip() {
    let m = IriMinter::new(BASE);
    let iri = m.entity_iri("dzhinni_uizli");
    assert_eq!(m.local_name(&iri), Some("dzhinni_uizli"));
    assert_eq!(m.local_name("http://other.org/x"), None);
}

// --- Page URLs ---

#[test]
fn page_url_replaces_spaces() {
    let url = page_url("https://wiki.example/ru/wiki/", "Гарри Поттер");
    assert!(url.starts_with("https://wiki.example/ru/wiki/"));
    assert!(!url.contains(' '));
    assert!(url.contains("%D0%93"), "Cyrillic should be percent-encoded: {url}");
}

#[test]
fn page_url_ascii_title_unchanged() {
    assert_eq!(
        page_url("https://wiki.example/ru/wiki/", "Some_Page"),
        "https://wiki.example/ru/wiki/Some_Page"
    );
}

#[test]
fn page_url_adds_separator() {
    assert_eq!(
        page_url("https://wiki.example/ru/wiki", "Page"),
        "https://wiki.example/ru/wiki/Page"
    );
}
