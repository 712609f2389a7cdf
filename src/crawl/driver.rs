//! Crawl orchestration: seed lists, category listings, link-following.
//!
//! The driver owns nothing global: it borrows the page source and the graph
//! store and threads them through extraction, classification and resolution.
//! Per-title failures degrade to a logged skip; only store durability
//! failures propagate.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crawl::fetcher::PageSource;
use crate::crawl::resolver::EntityResolver;
use crate::error::CrawlError;
use crate::extraction::classifier::{Classifier, PageSignals};
use crate::extraction::fields::{extract, CanonicalField};
use crate::graph::GraphStore;
use crate::html::{Anchor, Document};
use crate::model::iri::{page_url, slugify};
use crate::model::ontology::EntityType;

/// Counts reported after a run.
#[derive(Debug, Clone, Copy)]
pub struct CrawlSummary {
    pub nodes: usize,
    pub edges: usize,
}

pub struct Crawler<'a, S: PageSource> {
    cfg: &'a Config,
    classifier: Classifier<'a>,
    source: &'a mut S,
    store: &'a mut GraphStore,
    resolver: EntityResolver,
}

impl<'a, S: PageSource> Crawler<'a, S> {
    pub fn new(
        cfg: &'a Config,
        source: &'a mut S,
        store: &'a mut GraphStore,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            cfg,
            classifier: Classifier::new(&cfg.vocab)?,
            source,
            store,
            resolver: EntityResolver::new(),
        })
    }

    /// Run every configured strategy in order.
    pub fn run(&mut self) -> Result<CrawlSummary, CrawlError> {
        let cfg = self.cfg;
        self.seed_fixed()?;
        for title in &cfg.seeds.characters {
            self.scrape_character(title)?;
        }
        for category in &cfg.seeds.person_categories {
            info!("person category: {category}");
            for title in self.category_members(category, cfg.category_cap) {
                self.scrape_character(&title)?;
            }
        }
        for (category, ty) in &cfg.seeds.entity_categories {
            info!("entity category: {category} -> {}", ty.local_name());
            for title in self.category_members(category, cfg.entity_category_cap) {
                self.store.ensure_node(&title, *ty);
                self.store.checkpoint(false)?;
            }
        }
        if cfg.page_budget > 0 && !cfg.seeds.crawl_seeds.is_empty() {
            self.crawl_links()?;
        }
        Ok(self.summary())
    }

    /// Fixed-type seeds only; used by dry runs.
    pub fn run_offline(&mut self) -> Result<CrawlSummary, CrawlError> {
        self.seed_fixed()?;
        Ok(self.summary())
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            nodes: self.store.node_count(),
            edges: self.store.edge_count(),
        }
    }

    /// Assert the configured house/organization/location nodes without
    /// fetching: the seed list itself guarantees the type.
    fn seed_fixed(&mut self) -> Result<(), CrawlError> {
        let cfg = self.cfg;
        let groups = [
            (&cfg.seeds.houses, EntityType::House),
            (&cfg.seeds.organizations, EntityType::Organization),
            (&cfg.seeds.locations, EntityType::Location),
        ];
        for (titles, ty) in groups {
            for title in titles {
                if self.classifier.title_excluded(title) {
                    continue;
                }
                self.store.ensure_node(title, ty);
                self.store.checkpoint(false)?;
            }
        }
        Ok(())
    }

    /// Fetch, classify and link one character page. Every failure short of a
    /// store error degrades to a skip.
    pub fn scrape_character(&mut self, title: &str) -> Result<(), CrawlError> {
        self.scrape_page(title).map(|_| ())
    }

    /// Like [`scrape_character`](Self::scrape_character) but hands back the
    /// fetched document so the link crawl can harvest outbound links.
    fn scrape_page(&mut self, title: &str) -> Result<Option<Document>, CrawlError> {
        let cfg = self.cfg;
        if self.classifier.title_excluded(title) {
            debug!(title, "excluded before fetch");
            return Ok(None);
        }
        let url = page_url(&cfg.wiki_base, title);
        let doc = match self.source.fetch(&url) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(title, "skipping: {e}");
                return Ok(None);
            }
        };
        let page = extract(&doc, &cfg.vocab);
        let Some(infobox) = page.infobox.clone() else {
            debug!(title, "no infobox, skipping");
            return Ok(Some(doc));
        };
        let Some(ty) = self.classifier.classify(&PageSignals::new(title, &page)) else {
            debug!(title, "not a typeable page");
            return Ok(Some(doc));
        };
        let subject = self.store.ensure_node(title, ty);
        if let Some(sex) = infobox.text(CanonicalField::Sex) {
            self.store.set_comment(&subject, &sex);
        }

        for (field, spec) in &cfg.vocab.relation_fields {
            let Some(value) = infobox.value(*field) else {
                continue;
            };
            for candidate in value.candidates(&cfg.vocab.and_words) {
                if self.classifier.title_excluded(&candidate) {
                    continue;
                }
                let target_type = if spec.relation.links_characters() {
                    self.resolver
                        .resolve(&candidate, self.source, self.store, &self.classifier, cfg)
                        .unwrap_or(spec.fallback)
                } else {
                    spec.fallback
                };
                let object = self.store.ensure_node(&candidate, target_type);
                self.store.add_edge(&subject, spec.relation, &object);
            }
        }
        self.store.checkpoint(false)?;
        Ok(Some(doc))
    }

    /// Collect member titles of a category, following the pagination link
    /// until it disappears or the cap is reached. Fetch failures end the
    /// enumeration with whatever was gathered.
    fn category_members(&mut self, category: &str, cap: usize) -> Vec<String> {
        let cfg = self.cfg;
        let mut url = page_url(
            &cfg.wiki_base,
            &format!("{}{}", cfg.vocab.category_prefix, category),
        );
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        loop {
            let doc = match self.source.fetch(&url) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(category, "listing unavailable: {e}");
                    return members;
                }
            };
            for anchor in doc.anchors() {
                if !anchor.has_class("category-page__member-link") {
                    continue;
                }
                let title = anchor
                    .title
                    .clone()
                    .unwrap_or_else(|| anchor.text.clone());
                let title = title.trim().to_string();
                if title.is_empty()
                    || title.starts_with(cfg.vocab.category_prefix.as_str())
                    || self.classifier.title_excluded(&title)
                    || !seen.insert(slugify(&title))
                {
                    continue;
                }
                members.push(title);
                if members.len() >= cap {
                    return members;
                }
            }
            match doc
                .anchors()
                .into_iter()
                .find(|a| a.has_class("category-page__pagination-next"))
                .map(|a| a.href)
                .filter(|href| !href.is_empty())
            {
                Some(next) => url = absolutize(&cfg.wiki_base, &next),
                None => return members,
            }
        }
    }

    /// Breadth-first crawl over same-wiki article links, bounded by the page
    /// budget and a visited set keyed on slugs.
    fn crawl_links(&mut self) -> Result<(), CrawlError> {
        let cfg = self.cfg;
        let path_prefix = wiki_path_prefix(&cfg.wiki_base);
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for title in &cfg.seeds.crawl_seeds {
            if seen.insert(slugify(title)) {
                queue.push_back(title.clone());
            }
        }
        let mut remaining = cfg.page_budget;
        info!("link crawl: {} seeds, budget {}", queue.len(), remaining);
        while let Some(title) = queue.pop_front() {
            if remaining == 0 {
                break;
            }
            if self.classifier.title_excluded(&title) {
                continue;
            }
            remaining -= 1;
            let Some(doc) = self.scrape_page(&title)? else {
                continue;
            };
            let mut added = 0usize;
            for anchor in doc.anchors() {
                if added >= cfg.links_per_page {
                    break;
                }
                let Some(link_title) = article_link_title(&anchor, &path_prefix) else {
                    continue;
                };
                if self.classifier.title_excluded(&link_title) {
                    continue;
                }
                if seen.insert(slugify(&link_title)) {
                    queue.push_back(link_title);
                    added += 1;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Link helpers
// ---------------------------------------------------------------------------

/// Scheme+host part of the wiki base URL, for resolving rooted hrefs.
fn site_root(wiki_base: &str) -> String {
    if let Some(scheme_end) = wiki_base.find("://") {
        let after = scheme_end + 3;
        match wiki_base[after..].find('/') {
            Some(p) => wiki_base[..after + p].to_string(),
            None => wiki_base.to_string(),
        }
    } else {
        wiki_base.trim_end_matches('/').to_string()
    }
}

/// Path prefix of article URLs, e.g. `/ru/wiki/`.
fn wiki_path_prefix(wiki_base: &str) -> String {
    let root = site_root(wiki_base);
    wiki_base
        .strip_prefix(root.as_str())
        .unwrap_or("/wiki/")
        .to_string()
}

fn absolutize(wiki_base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", site_root(wiki_base), href)
    } else {
        format!("{}/{}", site_root(wiki_base), href)
    }
}

/// Title of a same-wiki, non-namespace article link, or `None`.
fn article_link_title(anchor: &Anchor, path_prefix: &str) -> Option<String> {
    let path = anchor
        .href
        .strip_prefix(path_prefix)
        .or_else(|| {
            anchor.href.find(path_prefix).and_then(|p| {
                // absolute URL into the same wiki
                anchor.href[..p]
                    .starts_with("http")
                    .then(|| &anchor.href[p + path_prefix.len()..])
            })
        })?
        .split(['?', '#'])
        .next()?;
    if path.is_empty() {
        return None;
    }
    let title = match &anchor.title {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => percent_encoding::percent_decode_str(path)
            .decode_utf8()
            .ok()?
            .replace('_', " "),
    };
    // Namespaced pages (categories, files, templates) carry a colon.
    if title.contains(':') {
        return None;
    }
    Some(title)
}
