//! Rule-table classification of a page into the entity taxonomy.
//!
//! The decision policy is a priority-ordered list of named rules; the first
//! rule with an opinion wins. Classification is a pure function of the page
//! signals -- no I/O, no shared state -- so each rule is testable on its own.

use regex::RegexBuilder;
use tracing::trace;

use crate::config::Vocabulary;
use crate::error::CrawlError;
use crate::extraction::fields::{CanonicalField, Infobox, PageData};
use crate::html::normalize_ws;
use crate::model::ontology::EntityType;

/// How far into the page text the lead-text heuristics look.
const LEAD_CHARS: usize = 300;
/// Media detection reads a tighter window: film mentions deep in a character
/// lead must not disqualify the page.
const MEDIA_LEAD_CHARS: usize = 120;

/// Inputs to one classification decision.
pub struct PageSignals<'a> {
    pub title: &'a str,
    pub infobox: Option<&'a Infobox>,
    pub categories: Vec<&'a str>,
    pub text: &'a str,
}

impl<'a> PageSignals<'a> {
    pub fn new(title: &'a str, page: &'a PageData) -> Self {
        Self {
            title,
            infobox: page.infobox.as_ref(),
            categories: page.categories.iter().map(String::as_str).collect(),
            text: &page.text,
        }
    }

    fn has(&self, field: CanonicalField) -> bool {
        self.infobox.is_some_and(|i| i.has(field))
    }

    fn field_text(&self, field: CanonicalField) -> Option<String> {
        self.infobox.and_then(|i| i.text(field))
    }

    fn lead(&self) -> String {
        self.text.chars().take(LEAD_CHARS).collect::<String>().to_lowercase()
    }
}

/// A rule's opinion about a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Not a typeable entity page at all.
    Exclude,
    Is(EntityType),
}

struct Rule {
    name: &'static str,
    apply: fn(&Classifier, &PageSignals) -> Option<Verdict>,
}

/// The merged decision policy, first match wins.
const RULES: &[Rule] = &[
    Rule { name: "excluded-title", apply: |c, s| c.rule_excluded_title(s) },
    Rule { name: "media-page", apply: |c, s| c.rule_media_page(s) },
    Rule { name: "house-name", apply: |c, s| c.rule_house_name(s) },
    Rule { name: "spell-fields", apply: |c, s| c.rule_spell_fields(s) },
    Rule { name: "artifact-fields", apply: |c, s| c.rule_artifact_fields(s) },
    Rule { name: "location-signals", apply: |c, s| c.rule_location_signals(s) },
    Rule { name: "organization-signals", apply: |c, s| c.rule_organization_signals(s) },
    Rule { name: "species-field", apply: |c, s| c.rule_species_field(s) },
    Rule { name: "category-table", apply: |c, s| c.rule_category_table(s) },
    Rule { name: "text-magic", apply: |c, s| c.rule_text_magic(s) },
    Rule { name: "text-creatures", apply: |c, s| c.rule_text_creatures(s) },
    Rule { name: "blood-status-only", apply: |c, s| c.rule_blood_status_only(s) },
    Rule { name: "default-human", apply: |c, s| c.rule_default_human(s) },
];

/// Classifies pages against a fixed vocabulary. Construction compiles the
/// title-exclusion patterns once; classification itself does no work besides
/// string matching.
pub struct Classifier<'v> {
    vocab: &'v Vocabulary,
    skip_patterns: Vec<regex::Regex>,
}

impl<'v> Classifier<'v> {
    pub fn new(vocab: &'v Vocabulary) -> Result<Self, CrawlError> {
        let mut skip_patterns = Vec::with_capacity(vocab.skip_title_patterns.len());
        for pattern in &vocab.skip_title_patterns {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| CrawlError::Config(format!("bad title pattern {pattern:?}: {e}")))?;
            skip_patterns.push(re);
        }
        Ok(Self { vocab, skip_patterns })
    }

    /// Title-only exclusion check, usable before any fetch is attempted:
    /// bare years, day+month dates and the configured skip patterns.
    pub fn title_excluded(&self, title: &str) -> bool {
        let title = normalize_ws(title);
        if title.is_empty() {
            return true;
        }
        let digits = title.chars().all(|c| c.is_ascii_digit());
        if digits && (3..=4).contains(&title.chars().count()) {
            return true;
        }
        let parts: Vec<&str> = title.split(' ').collect();
        if parts.len() == 2
            && !parts[0].is_empty()
            && parts[0].chars().count() <= 2
            && parts[0].chars().all(|c| c.is_ascii_digit())
        {
            let month = parts[1].to_lowercase();
            if self.vocab.months.iter().any(|m| *m == month) {
                return true;
            }
        }
        self.skip_patterns.iter().any(|re| re.is_match(&title))
    }

    /// Classify a page. `None` means the page is excluded from the graph.
    pub fn classify(&self, signals: &PageSignals) -> Option<EntityType> {
        for rule in RULES {
            if let Some(verdict) = (rule.apply)(self, signals) {
                trace!(title = signals.title, rule = rule.name, ?verdict, "classified");
                return match verdict {
                    Verdict::Exclude => None,
                    Verdict::Is(ty) => Some(ty),
                };
            }
        }
        // The default rule always fires; this is unreachable.
        Some(EntityType::Human)
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    fn rule_excluded_title(&self, s: &PageSignals) -> Option<Verdict> {
        self.title_excluded(s.title).then_some(Verdict::Exclude)
    }

    fn rule_media_page(&self, s: &PageSignals) -> Option<Verdict> {
        for cat in &s.categories {
            let cat = cat.to_lowercase();
            if contains_any(&cat, &self.vocab.media_category_markers) {
                return Some(Verdict::Exclude);
            }
        }
        let lead: String = s.text.chars().take(MEDIA_LEAD_CHARS).collect();
        let lead = lead.to_lowercase();
        if self
            .vocab
            .media_lead_stems
            .iter()
            .any(|stem| stem_match(&lead, stem))
        {
            return Some(Verdict::Exclude);
        }
        None
    }

    fn rule_house_name(&self, s: &PageSignals) -> Option<Verdict> {
        let title = normalize_ws(s.title).to_lowercase();
        self.vocab
            .house_names
            .iter()
            .any(|h| *h == title)
            .then_some(Verdict::Is(EntityType::House))
    }

    fn rule_spell_fields(&self, s: &PageSignals) -> Option<Verdict> {
        (s.has(CanonicalField::Incantation) || s.has(CanonicalField::SpellType))
            .then_some(Verdict::Is(EntityType::Spell))
    }

    fn rule_artifact_fields(&self, s: &PageSignals) -> Option<Verdict> {
        (s.has(CanonicalField::Owners) || s.has(CanonicalField::Makers))
            .then_some(Verdict::Is(EntityType::Artifact))
    }

    fn rule_location_signals(&self, s: &PageSignals) -> Option<Verdict> {
        if s.has(CanonicalField::Species) || s.has(CanonicalField::Owners) {
            return None;
        }
        if s.has(CanonicalField::PlaceName)
            || contains_any(&s.lead(), &self.vocab.location_lead_stems)
        {
            return Some(Verdict::Is(EntityType::Location));
        }
        None
    }

    fn rule_organization_signals(&self, s: &PageSignals) -> Option<Verdict> {
        if s.has(CanonicalField::Species) {
            return None;
        }
        if s.has(CanonicalField::Affiliation)
            || contains_any(&s.lead(), &self.vocab.organization_lead_stems)
        {
            return Some(Verdict::Is(EntityType::Organization));
        }
        None
    }

    /// The species chain: creatures first, then generic magic-user stems,
    /// then the human disambiguation path.
    fn rule_species_field(&self, s: &PageSignals) -> Option<Verdict> {
        let species = s.field_text(CanonicalField::Species)?.to_lowercase();
        if species.trim().is_empty() {
            return None;
        }
        for (stem, ty) in &self.vocab.creature_species {
            if stem_match(&species, stem) {
                return Some(Verdict::Is(*ty));
            }
        }
        if contains_any(&species, &self.vocab.wizard_species_stems) {
            return Some(Verdict::Is(EntityType::Wizard));
        }
        if contains_any(&species, &self.vocab.human_species_stems) {
            return Some(Verdict::Is(self.classify_human(s)));
        }
        None
    }

    /// A human by species: blood status decides, then house affiliation,
    /// categories and schooling mentions, defaulting to plain Human.
    fn classify_human(&self, s: &PageSignals) -> EntityType {
        if let Some(ty) = self.classify_by_blood(s) {
            return ty;
        }
        if let Some(house) = s.field_text(CanonicalField::House) {
            if contains_any(&house.to_lowercase(), &self.vocab.house_names) {
                return EntityType::Wizard;
            }
        }
        if s.categories
            .iter()
            .any(|c| contains_any(&c.to_lowercase(), &self.vocab.magic_category_stems))
        {
            return EntityType::Wizard;
        }
        if contains_any(&s.text.to_lowercase(), &self.vocab.school_text_stems) {
            return EntityType::Wizard;
        }
        EntityType::Human
    }

    fn classify_by_blood(&self, s: &PageSignals) -> Option<EntityType> {
        let blood = s.field_text(CanonicalField::BloodStatus)?.to_lowercase();
        if blood.trim().is_empty() {
            return None;
        }
        if stem_match_any(&blood, &self.vocab.muggle_born_stems) {
            return Some(EntityType::Wizard);
        }
        if stem_match_any(&blood, &self.vocab.squib_stems) {
            return Some(EntityType::Squib);
        }
        if stem_match_any(&blood, &self.vocab.wizard_blood_stems) {
            return Some(EntityType::Wizard);
        }
        if stem_match_any(&blood, &self.vocab.muggle_stems)
            && !stem_match_any(&blood, &self.vocab.muggle_born_stems)
        {
            return Some(EntityType::Muggle);
        }
        None
    }

    fn rule_category_table(&self, s: &PageSignals) -> Option<Verdict> {
        for cat in &s.categories {
            if let Some(ty) = self.vocab.category_types.get(*cat) {
                return Some(Verdict::Is(*ty));
            }
        }
        for cat in &s.categories {
            if contains_any(&cat.to_lowercase(), &self.vocab.magic_category_stems) {
                return Some(Verdict::Is(EntityType::Wizard));
            }
        }
        None
    }

    fn rule_text_magic(&self, s: &PageSignals) -> Option<Verdict> {
        contains_any(&s.text.to_lowercase(), &self.vocab.magic_text_stems)
            .then_some(Verdict::Is(EntityType::Wizard))
    }

    fn rule_text_creatures(&self, s: &PageSignals) -> Option<Verdict> {
        let text = s.text.to_lowercase();
        for (stem, ty) in &self.vocab.creature_species {
            if stem_match(&text, stem) {
                return Some(Verdict::Is(*ty));
            }
        }
        None
    }

    fn rule_blood_status_only(&self, s: &PageSignals) -> Option<Verdict> {
        if s.has(CanonicalField::Species) {
            return None;
        }
        self.classify_by_blood(s).map(Verdict::Is)
    }

    fn rule_default_human(&self, _s: &PageSignals) -> Option<Verdict> {
        Some(Verdict::Is(EntityType::Human))
    }
}

// ---------------------------------------------------------------------------
// Matching helpers
// ---------------------------------------------------------------------------

/// Whole-word, stem-tolerant match: `stem` must start at a word boundary but
/// may be followed by further word characters, so "русалк" matches
/// "русалки" and "домовой эльф" matches "домовой эльф-экономка".
fn stem_match(text_lower: &str, stem: &str) -> bool {
    let stem = stem.to_lowercase();
    let mut start = 0;
    while let Some(pos) = text_lower[start..].find(stem.as_str()) {
        let at = start + pos;
        let boundary = text_lower[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        if boundary {
            return true;
        }
        start = at + stem.len();
    }
    false
}

fn stem_match_any(text_lower: &str, stems: &[String]) -> bool {
    stems.iter().any(|stem| stem_match(text_lower, stem))
}

fn contains_any(text_lower: &str, stems: &[String]) -> bool {
    stems
        .iter()
        .any(|stem| text_lower.contains(stem.to_lowercase().as_str()))
}
