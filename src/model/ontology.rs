//! Closed RDF vocabulary for the wiki entity graph.
//!
//! The entity taxonomy and relation set mirror the ontology this tool
//! populates: a fixed class tree rooted at `Thing` and a fixed list of
//! object properties. Both are closed -- config tables reference them by
//! local name, they are never extended at runtime.

use serde::{Deserialize, Serialize};

/// Standard RDF/RDFS/OWL namespace URIs.
pub mod standard {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// One class in the closed entity taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Thing,
    Artifact,
    Character,
    Human,
    Muggle,
    Squib,
    Wizard,
    #[serde(rename = "Magical_creature")]
    MagicalCreature,
    Centaur,
    Ghost,
    Giant,
    #[serde(rename = "Giant_spider")]
    GiantSpider,
    #[serde(rename = "House_elf")]
    HouseElf,
    Mermaid,
    House,
    Location,
    Organization,
    Potion,
    Role,
    Spell,
    Event,
}

impl EntityType {
    /// All classes, in the order they are declared in a snapshot.
    pub const ALL: &'static [EntityType] = &[
        EntityType::Thing,
        EntityType::Artifact,
        EntityType::Character,
        EntityType::Human,
        EntityType::Muggle,
        EntityType::Squib,
        EntityType::Wizard,
        EntityType::MagicalCreature,
        EntityType::Centaur,
        EntityType::Ghost,
        EntityType::Giant,
        EntityType::GiantSpider,
        EntityType::HouseElf,
        EntityType::Mermaid,
        EntityType::House,
        EntityType::Location,
        EntityType::Organization,
        EntityType::Potion,
        EntityType::Role,
        EntityType::Spell,
        EntityType::Event,
    ];

    /// Local name used in IRIs and config tables.
    pub fn local_name(self) -> &'static str {
        match self {
            EntityType::Thing => "Thing",
            EntityType::Artifact => "Artifact",
            EntityType::Character => "Character",
            EntityType::Human => "Human",
            EntityType::Muggle => "Muggle",
            EntityType::Squib => "Squib",
            EntityType::Wizard => "Wizard",
            EntityType::MagicalCreature => "Magical_creature",
            EntityType::Centaur => "Centaur",
            EntityType::Ghost => "Ghost",
            EntityType::Giant => "Giant",
            EntityType::GiantSpider => "Giant_spider",
            EntityType::HouseElf => "House_elf",
            EntityType::Mermaid => "Mermaid",
            EntityType::House => "House",
            EntityType::Location => "Location",
            EntityType::Organization => "Organization",
            EntityType::Potion => "Potion",
            EntityType::Role => "Role",
            EntityType::Spell => "Spell",
            EntityType::Event => "Event",
        }
    }

    pub fn from_local_name(name: &str) -> Option<EntityType> {
        Self::ALL.iter().copied().find(|t| t.local_name() == name)
    }

    /// Parent class in the taxonomy; `None` only for the root.
    pub fn parent(self) -> Option<EntityType> {
        match self {
            EntityType::Thing => None,
            EntityType::Artifact
            | EntityType::Character
            | EntityType::Event
            | EntityType::House
            | EntityType::Location
            | EntityType::Organization
            | EntityType::Potion
            | EntityType::Role
            | EntityType::Spell => Some(EntityType::Thing),
            EntityType::Human | EntityType::MagicalCreature => Some(EntityType::Character),
            EntityType::Muggle | EntityType::Squib | EntityType::Wizard => Some(EntityType::Human),
            EntityType::Centaur
            | EntityType::Ghost
            | EntityType::Giant
            | EntityType::GiantSpider
            | EntityType::HouseElf
            | EntityType::Mermaid => Some(EntityType::MagicalCreature),
        }
    }
}

/// Character taxonomy ordered most-specific first: named creature subtypes
/// outrank Wizard, which outranks the other human subtypes, which outrank
/// the generic Character supertype.
pub const SPECIFICITY: &[EntityType] = &[
    EntityType::Centaur,
    EntityType::Ghost,
    EntityType::Giant,
    EntityType::GiantSpider,
    EntityType::HouseElf,
    EntityType::Mermaid,
    EntityType::Wizard,
    EntityType::Muggle,
    EntityType::Squib,
    EntityType::Human,
    EntityType::Character,
];

/// Pick the most specific type among competing signals.
///
/// Candidates outside the character taxonomy (e.g. `Location`) only win when
/// no ranked candidate is present; with no candidates at all the generic
/// `Character` supertype is returned.
pub fn choose_most_specific(candidates: &[EntityType]) -> EntityType {
    for ty in SPECIFICITY {
        if candidates.contains(ty) {
            return *ty;
        }
    }
    candidates.first().copied().unwrap_or(EntityType::Character)
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// One object property in the closed relation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    MemberOf,
    StudiedAt,
    HasFather,
    HasMother,
    MarriedWith,
    RomanceWith,
    FriendWith,
    RelativeOf,
    HasRole,
    ActiveAt,
    ParticipatedIn,
    TakePartInEvent,
    TookPlaceAt,
    ArtifactInvolvedIn,
}

impl Relation {
    /// All properties, in declaration order.
    pub const ALL: &'static [Relation] = &[
        Relation::MemberOf,
        Relation::StudiedAt,
        Relation::HasFather,
        Relation::HasMother,
        Relation::MarriedWith,
        Relation::RomanceWith,
        Relation::FriendWith,
        Relation::RelativeOf,
        Relation::HasRole,
        Relation::ActiveAt,
        Relation::ParticipatedIn,
        Relation::TakePartInEvent,
        Relation::TookPlaceAt,
        Relation::ArtifactInvolvedIn,
    ];

    pub fn local_name(self) -> &'static str {
        match self {
            Relation::MemberOf => "memberOf",
            Relation::StudiedAt => "studiedAt",
            Relation::HasFather => "hasFather",
            Relation::HasMother => "hasMother",
            Relation::MarriedWith => "marriedWith",
            Relation::RomanceWith => "romanceWith",
            Relation::FriendWith => "friendWith",
            Relation::RelativeOf => "relativeOf",
            Relation::HasRole => "hasRole",
            Relation::ActiveAt => "activeAt",
            Relation::ParticipatedIn => "participatedIn",
            Relation::TakePartInEvent => "takePartInEvent",
            Relation::TookPlaceAt => "tookPlaceAt",
            Relation::ArtifactInvolvedIn => "artifactInvolvedIn",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Relation> {
        Self::ALL.iter().copied().find(|r| r.local_name() == name)
    }

    /// Relations whose objects are people: the crawler resolves the target's
    /// real type from its own page instead of trusting the field fallback.
    pub fn links_characters(self) -> bool {
        matches!(
            self,
            Relation::MarriedWith
                | Relation::HasFather
                | Relation::HasMother
                | Relation::FriendWith
                | Relation::RomanceWith
                | Relation::RelativeOf
        )
    }
}
