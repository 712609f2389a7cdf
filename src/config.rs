//! Run configuration and classification vocabulary.
//!
//! Everything here is data, not behavior: the defaults reproduce the
//! Russian-language wiki vocabulary the tool was built against, and every
//! table can be overridden from a TOML file without touching the classifier.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CrawlError;
use crate::extraction::fields::CanonicalField;
use crate::model::ontology::{EntityType, Relation};

/// Infobox field -> relation to emit, plus the type assumed for the target
/// when its own page cannot pin one down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RelationSpec {
    pub relation: Relation,
    pub fallback: EntityType,
}

/// Seed material for the crawl strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Seeds {
    /// Titles scraped as character pages.
    pub characters: Vec<String>,
    /// Titles asserted directly as House nodes, no fetch.
    pub houses: Vec<String>,
    /// Titles asserted directly as Organization nodes.
    pub organizations: Vec<String>,
    /// Titles asserted directly as Location nodes.
    pub locations: Vec<String>,
    /// Categories whose members are scraped as character pages.
    pub person_categories: Vec<String>,
    /// Categories whose members get the paired type without classification.
    pub entity_categories: Vec<(String, EntityType)>,
    /// Start titles for the link-following crawl (off unless `page_budget`
    /// is set).
    pub crawl_seeds: Vec<String>,
}

impl Default for Seeds {
    fn default() -> Self {
        Self {
            characters: strings(&[
                "Гарри Поттер",
                "Гермиона Грейнджер",
                "Рон Уизли",
                "Альбус Дамблдор",
                "Северус Снегг",
                "Драко Малфой",
                "Рубеус Хагрид",
                "Минерва Макгонагалл",
                "Сириус Блэк",
                "Лорд Волан-де-Морт",
            ]),
            houses: strings(&["Гриффиндор", "Слизерин", "Когтевран", "Пуффендуй"]),
            organizations: strings(&["Орден Феникса", "Пожиратели смерти", "Министерство магии"]),
            locations: strings(&["Хогвартс", "Косой переулок", "Хогсмид", "Азкабан"]),
            person_categories: strings(&[
                "Персонажи",
                "Люди",
                "Маги",
                "Ученики Хогвартса",
                "Преподаватели Хогвартса",
                "Домовые эльфы",
                "Привидения",
                "Кентавры",
                "Акромантулы",
                "Великаны",
                "Русалки",
            ]),
            entity_categories: vec![
                ("Локации".into(), EntityType::Location),
                ("Организации".into(), EntityType::Organization),
                ("Артефакты".into(), EntityType::Artifact),
                ("Должности".into(), EntityType::Role),
                ("Заклинания".into(), EntityType::Spell),
                ("Зелья".into(), EntityType::Potion),
            ],
            crawl_seeds: Vec::new(),
        }
    }
}

/// All keyword and lookup tables consumed by extraction and classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Namespace prefix for category pages ("Категория:").
    pub category_prefix: String,
    /// Title patterns that disqualify a page outright (regex, matched
    /// case-insensitively against the whitespace-normalized title).
    pub skip_title_patterns: Vec<String>,
    /// Month names in the form used by day+month date titles.
    pub months: Vec<String>,
    /// Category substrings marking a real-world media page.
    pub media_category_markers: Vec<String>,
    /// Lead-text stems marking a real-world media page.
    pub media_lead_stems: Vec<String>,
    /// Raw infobox label (lowercased) -> canonical field.
    pub field_aliases: BTreeMap<String, CanonicalField>,
    /// Canonical field -> emitted relation and fallback target type.
    pub relation_fields: BTreeMap<CanonicalField, RelationSpec>,
    /// Exact category label -> type.
    pub category_types: BTreeMap<String, EntityType>,
    /// Ordered creature stems checked against the species field and, as a
    /// last resort, the page text.
    pub creature_species: Vec<(String, EntityType)>,
    pub wizard_species_stems: Vec<String>,
    pub human_species_stems: Vec<String>,
    pub muggle_born_stems: Vec<String>,
    pub squib_stems: Vec<String>,
    pub wizard_blood_stems: Vec<String>,
    pub muggle_stems: Vec<String>,
    /// The four school houses, lowercased.
    pub house_names: Vec<String>,
    /// Category substrings that imply a magic-user.
    pub magic_category_stems: Vec<String>,
    /// Page-text stems that imply schooling in magic.
    pub school_text_stems: Vec<String>,
    /// Page-text stems that imply a magic-user.
    pub magic_text_stems: Vec<String>,
    /// Lead-text stems that imply a place.
    pub location_lead_stems: Vec<String>,
    /// Lead-text stems that imply an organization.
    pub organization_lead_stems: Vec<String>,
    /// Conjunctions treated as list separators in free-text field values.
    pub and_words: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        use CanonicalField::*;
        use EntityType as T;
        Self {
            category_prefix: "Категория:".into(),
            skip_title_patterns: strings(&[
                r"\(персонаж(и)?(\s+фильма)?\)$",
                r"^Список([\s:]|$)",
                r"^Персонажи(\s|$)",
                r"^Категория:",
                r"\((фильм|книга|саундтрек|игра|видеоигра|значения)\)$",
            ]),
            months: strings(&[
                "января",
                "февраля",
                "марта",
                "апреля",
                "мая",
                "июня",
                "июля",
                "августа",
                "сентября",
                "октября",
                "ноября",
                "декабря",
            ]),
            media_category_markers: strings(&[
                "фильмы",
                "саундтреки",
                "видеоигры",
                "реальный мир",
            ]),
            media_lead_stems: strings(&["фильм", "саундтрек", "видеоигр", "экранизац"]),
            field_aliases: [
                ("вид", Species),
                ("вид(ы)", Species),
                ("раса", Species),
                ("раса/вид", Species),
                ("принадлежность к виду", Species),
                ("species", Species),
                ("race", Species),
                ("чистота крови", BloodStatus),
                ("пол", Sex),
                ("дом", House),
                ("факультет", House),
                ("организация", Affiliation),
                ("принадлежность", Affiliation),
                ("сторона", Affiliation),
                ("место обучения", School),
                ("обучался в", School),
                ("школа", School),
                ("учился в", School),
                ("род занятий", Occupation),
                ("профессия", Occupation),
                ("должность", Occupation),
                ("специальность", Occupation),
                ("супруг", Spouse),
                ("супруга", Spouse),
                ("супруг(а)", Spouse),
                ("отец", Father),
                ("мать", Mother),
                ("друзья", Friends),
                ("любовный интерес", Romance),
                ("романтические отношения", Romance),
                ("родственники", Relatives),
                ("семья", Relatives),
                ("заклинание", Incantation),
                ("произношение", Incantation),
                ("тип заклинания", SpellType),
                ("владелец", Owners),
                ("владельцы", Owners),
                ("хозяин", Owners),
                ("изготовитель", Makers),
                ("производитель", Makers),
                ("расположение", PlaceName),
                ("местоположение", PlaceName),
                ("местонахождение", PlaceName),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
            relation_fields: [
                (House, RelationSpec { relation: Relation::MemberOf, fallback: T::House }),
                (Affiliation, RelationSpec { relation: Relation::MemberOf, fallback: T::Organization }),
                (School, RelationSpec { relation: Relation::StudiedAt, fallback: T::Location }),
                (Occupation, RelationSpec { relation: Relation::HasRole, fallback: T::Role }),
                (Spouse, RelationSpec { relation: Relation::MarriedWith, fallback: T::Character }),
                (Father, RelationSpec { relation: Relation::HasFather, fallback: T::Character }),
                (Mother, RelationSpec { relation: Relation::HasMother, fallback: T::Character }),
                (Friends, RelationSpec { relation: Relation::FriendWith, fallback: T::Character }),
                (Romance, RelationSpec { relation: Relation::RomanceWith, fallback: T::Character }),
                (Relatives, RelationSpec { relation: Relation::RelativeOf, fallback: T::Character }),
            ]
            .into_iter()
            .collect(),
            category_types: [
                ("Люди", T::Human),
                ("Маги", T::Wizard),
                ("Маги по алфавиту", T::Wizard),
                ("Магглы", T::Muggle),
                ("Сквибы", T::Squib),
                ("Маглорождённые волшебники", T::Wizard),
                ("Чистокровные волшебники", T::Wizard),
                ("Полукровки", T::Wizard),
                ("Домовые эльфы", T::HouseElf),
                ("Привидения", T::Ghost),
                ("Кентавры", T::Centaur),
                ("Акромантулы", T::GiantSpider),
                ("Великаны", T::Giant),
                ("Русалки", T::Mermaid),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
            creature_species: [
                ("кентавр", T::Centaur),
                ("привидение", T::Ghost),
                ("призрак", T::Ghost),
                ("великан", T::Giant),
                ("гигант", T::Giant),
                ("акромантул", T::GiantSpider),
                ("домовой эльф", T::HouseElf),
                ("домовик", T::HouseElf),
                ("эльф", T::HouseElf),
                ("русалк", T::Mermaid),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
            wizard_species_stems: strings(&["волшебник", "волшебниц", "маг", "ведьм"]),
            human_species_stems: strings(&["челов"]),
            muggle_born_stems: strings(&["маглорожд", "магглорожд"]),
            squib_stems: strings(&["сквиб"]),
            wizard_blood_stems: strings(&["чистокров", "полукров", "грязнокров"]),
            muggle_stems: strings(&["магл", "маггл"]),
            house_names: strings(&["гриффиндор", "слизерин", "когтевран", "пуффендуй"]),
            magic_category_stems: strings(&["хогвартс", "маг", "волшебник"]),
            school_text_stems: strings(&["обучал", "училась в хогвартсе", "хогвартс"]),
            magic_text_stems: strings(&["хогвартс", "палочк", "чары", "волшебник"]),
            location_lead_stems: strings(&[
                "деревн",
                "замок",
                "улиц",
                "переулок",
                "магазин",
                "город",
                "остров",
                "гора",
                "озеро",
            ]),
            organization_lead_stems: strings(&[
                "орден",
                "министерств",
                "организаци",
                "объединени",
                "общество",
                "команд",
                "клуб",
            ]),
            and_words: strings(&[" и "]),
        }
    }
}

/// Full run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace for minted IRIs.
    pub base_iri: String,
    /// Article URL prefix of the source wiki.
    pub wiki_base: String,
    /// Language tag for labels and comments.
    pub language: String,
    /// Snapshot path.
    pub output: PathBuf,
    /// Mutations between automatic checkpoints.
    pub checkpoint_every: u64,
    /// Minimum delay between HTTP requests.
    pub request_delay_ms: u64,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Retry bound for transient HTTP failures.
    pub max_retries: u32,
    /// First backoff step; doubles per retry.
    pub backoff_ms: u64,
    /// Member cap for person categories.
    pub category_cap: usize,
    /// Member cap for fixed-type entity categories.
    pub entity_category_cap: usize,
    /// Page budget for the link-following crawl; 0 disables it.
    pub page_budget: usize,
    /// Outbound links enqueued per visited page.
    pub links_per_page: usize,
    pub seeds: Seeds,
    pub vocab: Vocabulary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_iri: "http://www.semanticweb.org/ontologies/harry_potter#".into(),
            wiki_base: "https://harrypotter.fandom.com/ru/wiki/".into(),
            language: "ru".into(),
            output: PathBuf::from("harrypotter_kg_ru.ttl"),
            checkpoint_every: 120,
            request_delay_ms: 200,
            request_timeout_secs: 20,
            max_retries: 4,
            backoff_ms: 500,
            category_cap: 400,
            entity_category_cap: 300,
            page_budget: 0,
            links_per_page: 25,
            seeds: Seeds::default(),
            vocab: Vocabulary::default(),
        }
    }
}

impl Config {
    /// Load a TOML config file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Config, CrawlError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CrawlError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| CrawlError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
