//! Lazy, memoized resolution of a title to its entity type.
//!
//! A relation target ("spouse of X") gets a precise type by fetching and
//! classifying its own page on demand. Memoization bounds the cost: within
//! one run a title is fetched at most once, and a cache hit never re-fetches.
//! The cache is per-run and never shared across runs.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::crawl::fetcher::PageSource;
use crate::extraction::classifier::{Classifier, PageSignals};
use crate::extraction::fields::extract;
use crate::graph::GraphStore;
use crate::model::iri::{page_url, slugify};
use crate::model::ontology::{choose_most_specific, EntityType};

#[derive(Default)]
pub struct EntityResolver {
    cache: HashMap<String, Option<EntityType>>,
}

impl EntityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the type for a title, `None` meaning undetermined.
    ///
    /// A type already recorded in the graph is returned without a fetch.
    /// The one exception is a bare generic `Character` assertion, which is
    /// what relation targets get as a provisional fallback: for those the
    /// page is still consulted (once) and the more specific of the two
    /// signals wins.
    pub fn resolve<S: PageSource>(
        &mut self,
        title: &str,
        source: &mut S,
        store: &GraphStore,
        classifier: &Classifier,
        cfg: &Config,
    ) -> Option<EntityType> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let slug = slugify(title);
        let recorded = store.node_type(&slug);
        if let Some(ty) = recorded {
            if ty != EntityType::Character {
                return Some(ty);
            }
        }
        if let Some(cached) = self.cache.get(&slug) {
            return merge(recorded, *cached);
        }
        let detected = detect(title, source, classifier, cfg);
        self.cache.insert(slug, detected);
        merge(recorded, detected)
    }
}

/// Fetch a title's own page and classify it; any failure or a page without
/// an infobox resolves to undetermined.
fn detect<S: PageSource>(
    title: &str,
    source: &mut S,
    classifier: &Classifier,
    cfg: &Config,
) -> Option<EntityType> {
    let url = page_url(&cfg.wiki_base, title);
    let doc = match source.fetch(&url) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(title, "page unavailable: {e}");
            return None;
        }
    };
    let page = extract(&doc, &cfg.vocab);
    if page.infobox.is_none() {
        debug!(title, "no infobox, not an entity page");
        return None;
    }
    classifier.classify(&PageSignals::new(title, &page))
}

fn merge(recorded: Option<EntityType>, detected: Option<EntityType>) -> Option<EntityType> {
    match (recorded, detected) {
        (Some(a), Some(b)) => Some(choose_most_specific(&[a, b])),
        (a, b) => b.or(a),
    }
}
