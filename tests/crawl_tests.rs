//! End-to-end crawl tests against a canned page source. No network.

use std::collections::HashMap;

use wiki2rdf::config::{Config, Seeds};
use wiki2rdf::crawl::driver::Crawler;
use wiki2rdf::crawl::fetcher::PageSource;
use wiki2rdf::error::FetchError;
use wiki2rdf::graph::{GraphStore, SnapshotFormat, StoreOptions};
use wiki2rdf::html::Document;
use wiki2rdf::model::iri::{page_url, slugify};
use wiki2rdf::model::ontology::{EntityType, Relation};

const WIKI_BASE: &str = "https://test.wiki/ru/wiki/";

/// Serves canned HTML by URL and records every request.
struct StubSource {
    pages: HashMap<String, String>,
    fetched: Vec<String>,
}

impl StubSource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fetched: Vec::new(),
        }
    }

    fn add_page(&mut self, title: &str, html: String) {
        self.pages.insert(page_url(WIKI_BASE, title), html);
    }

    fn fetches_of(&self, title: &str) -> usize {
        let url = page_url(WIKI_BASE, title);
        self.fetched.iter().filter(|u| **u == url).count()
    }
}

impl PageSource for StubSource {
    fn fetch(&mut self, url: &str) -> Result<Document, FetchError> {
        self.fetched.push(url.to_string());
        match self.pages.get(url) {
            Some(html) => Ok(Document::parse(html.clone())),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

fn character_page(rows: &[(&str, &str)], body: &str) -> String {
    let mut html = String::from("<html><body><aside class=\"portable-infobox\">");
    for (label, value) in rows {
        html.push_str(&format!(
            "<div class=\"pi-item pi-data\">\
             <h3 class=\"pi-data-label\">{label}</h3>\
             <div class=\"pi-data-value\">{value}</div></div>"
        ));
    }
    html.push_str(&format!("</aside><p>{body}</p></body></html>"));
    html
}

fn link(title: &str) -> String {
    format!(
        "<a href=\"/ru/wiki/{}\" title=\"{title}\">{title}</a>",
        title.replace(' ', "_")
    )
}

fn empty_seeds() -> Seeds {
    Seeds {
        characters: Vec::new(),
        houses: Vec::new(),
        organizations: Vec::new(),
        locations: Vec::new(),
        person_categories: Vec::new(),
        entity_categories: Vec::new(),
        crawl_seeds: Vec::new(),
    }
}

fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut cfg = Config::default();
    cfg.wiki_base = WIKI_BASE.into();
    cfg.base_iri = "http://example.org/hp#".into();
    cfg.output = dir.path().join("graph.ttl");
    cfg.checkpoint_every = 10_000;
    cfg.seeds = empty_seeds();
    cfg
}

fn store_for(cfg: &Config) -> GraphStore {
    GraphStore::new(StoreOptions {
        base_iri: cfg.base_iri.clone(),
        language: cfg.language.clone(),
        output: cfg.output.clone(),
        format: SnapshotFormat::Turtle,
        checkpoint_every: cfg.checkpoint_every,
    })
}

// --- Fixed-type seeds ---

#[test]
fn fixed_type_seed_creates_one_node_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.houses = vec!["Гриффиндор".into()];
    let mut store = store_for(&cfg);
    let mut source = StubSource::new();
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    assert!(source.fetched.is_empty(), "fixed seeds must not fetch");
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.edge_count(), 0);
    let id = slugify("Гриффиндор");
    assert_eq!(store.node_type(&id), Some(EntityType::House));
    assert_eq!(store.node_labels(&id), vec!["Гриффиндор".to_string()]);
}

// --- Character scraping + lazy resolution ---

#[test]
fn spouse_is_resolved_through_her_own_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec!["Гарри Поттер".into()];
    let mut source = StubSource::new();
    source.add_page(
        "Гарри Поттер",
        character_page(
            &[
                ("Вид", "человек"),
                ("Чистота крови", "полукровка"),
                ("Супруга", &link("Джинни Уизли")),
            ],
            "Обучался в Хогвартсе.",
        ),
    );
    source.add_page(
        "Джинни Уизли",
        character_page(
            &[("Вид", "человек"), ("Чистота крови", "чистокровная")],
            "Обучалась в Хогвартсе.",
        ),
    );
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }

    let harry = slugify("Гарри Поттер");
    let ginny = slugify("Джинни Уизли");
    assert_eq!(store.node_type(&harry), Some(EntityType::Wizard));
    // Resolved through her own page, not the generic Character fallback
    assert_eq!(store.node_type(&ginny), Some(EntityType::Wizard));
    let married: Vec<_> = store
        .edges()
        .filter(|(s, r, o)| *s == harry && *r == Relation::MarriedWith && *o == ginny)
        .collect();
    assert_eq!(married.len(), 1, "exactly one marriedWith edge");
    assert_eq!(source.fetches_of("Джинни Уизли"), 1);
}

#[test]
fn resolver_memoizes_repeated_targets() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec!["Гарри Поттер".into()];
    let mut source = StubSource::new();
    source.add_page(
        "Гарри Поттер",
        character_page(
            &[
                ("Вид", "человек"),
                ("Супруга", &link("Джинни Уизли")),
                ("Романтические отношения", "Джинни Уизли"),
            ],
            "Обучался в Хогвартсе.",
        ),
    );
    source.add_page(
        "Джинни Уизли",
        character_page(&[("Вид", "человек")], "Обучалась в Хогвартсе."),
    );
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    // Two person relations point at her, but her page is fetched once
    assert_eq!(source.fetches_of("Джинни Уизли"), 1);
    assert_eq!(store.edge_count(), 2);
}

#[test]
fn unresolvable_target_gets_the_fallback_type() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec!["Гарри Поттер".into()];
    let mut source = StubSource::new();
    source.add_page(
        "Гарри Поттер",
        character_page(
            &[("Вид", "человек"), ("Отец", &link("Джеймс Поттер"))],
            "Обучался в Хогвартсе.",
        ),
    );
    // No page for Джеймс Поттер: 404 degrades to the field fallback
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    let james = slugify("Джеймс Поттер");
    assert_eq!(store.node_type(&james), Some(EntityType::Character));
    assert_eq!(store.edge_count(), 1);
}

#[test]
fn page_without_infobox_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec!["Платформа 9 3/4".into()];
    let mut source = StubSource::new();
    source.add_page(
        "Платформа 9 3/4",
        "<html><body><p>Просто страница.</p></body></html>".into(),
    );
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    assert_eq!(store.node_count(), 0);
}

#[test]
fn excluded_titles_are_never_fetched() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec![
        "1991".into(),
        "12 июля".into(),
        "Гарри Поттер (фильм)".into(),
        "Список заклинаний".into(),
    ];
    let mut source = StubSource::new();
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    assert!(source.fetched.is_empty(), "exclusions must save request budget");
    assert_eq!(store.node_count(), 0);
}

#[test]
fn fetch_failure_degrades_to_skip() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.characters = vec!["Недоступная страница".into()];
    let mut source = StubSource::new();
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        // 404 on the only seed: the run still succeeds
        crawler.run().unwrap();
    }
    assert_eq!(store.node_count(), 0);
}

// --- Category enumeration ---

#[test]
fn category_members_get_the_fixed_type_across_pages() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.seeds.entity_categories = vec![("Заклинания".into(), EntityType::Spell)];
    let mut source = StubSource::new();

    let page2_href = "/ru/wiki/Категория:Заклинания?from=Люмос";
    let page1 = format!(
        "<html><body>\
         <a class=\"category-page__member-link\" href=\"/ru/wiki/Экспеллиармус\" title=\"Экспеллиармус\">Экспеллиармус</a>\
         <a class=\"category-page__member-link\" href=\"/ru/wiki/Люмос\" title=\"Люмос\">Люмос</a>\
         <a class=\"category-page__pagination-next\" href=\"{page2_href}\">Далее</a>\
         </body></html>"
    );
    let page2 = "<html><body>\
         <a class=\"category-page__member-link\" href=\"/ru/wiki/Нокс\" title=\"Нокс\">Нокс</a>\
         </body></html>"
        .to_string();
    source
        .pages
        .insert(page_url(WIKI_BASE, "Категория:Заклинания"), page1);
    source
        .pages
        .insert(format!("https://test.wiki{page2_href}"), page2);

    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    assert_eq!(store.node_count(), 3);
    for title in ["Экспеллиармус", "Люмос", "Нокс"] {
        assert_eq!(
            store.node_type(&slugify(title)),
            Some(EntityType::Spell),
            "{title} should be a Spell"
        );
    }
}

#[test]
fn category_cap_bounds_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.entity_category_cap = 1;
    cfg.seeds.entity_categories = vec![("Зелья".into(), EntityType::Potion)];
    let mut source = StubSource::new();
    let listing = "<html><body>\
         <a class=\"category-page__member-link\" href=\"/ru/wiki/A\" title=\"Оборотное зелье\">Оборотное зелье</a>\
         <a class=\"category-page__member-link\" href=\"/ru/wiki/B\" title=\"Феликс Фелицис\">Феликс Фелицис</a>\
         </body></html>"
        .to_string();
    source
        .pages
        .insert(page_url(WIKI_BASE, "Категория:Зелья"), listing);
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    assert_eq!(store.node_count(), 1);
}

// --- Link-following crawl ---

#[test]
fn link_crawl_visits_outbound_links_within_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.page_budget = 2;
    cfg.seeds.crawl_seeds = vec!["Гарри Поттер".into()];
    let mut source = StubSource::new();
    source.add_page(
        "Гарри Поттер",
        character_page(
            &[("Вид", "человек"), ("Супруга", &link("Джинни Уизли"))],
            "Обучался в Хогвартсе.",
        ),
    );
    source.add_page(
        "Джинни Уизли",
        character_page(&[("Вид", "человек")], "Обучалась в Хогвартсе."),
    );
    let mut store = store_for(&cfg);
    {
        let mut crawler = Crawler::new(&cfg, &mut source, &mut store).unwrap();
        crawler.run().unwrap();
    }
    // Seed page and the linked page, nothing beyond the budget
    assert!(source.fetches_of("Гарри Поттер") >= 1);
    assert!(source.fetches_of("Джинни Уизли") >= 1);
    assert_eq!(store.node_type(&slugify("Гарри Поттер")), Some(EntityType::Wizard));
}
