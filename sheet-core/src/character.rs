//! Normalized character record.
//!
//! A [`CharacterRecord`] is built once per import by
//! [`normalize`](crate::normalize::normalize) and never mutated afterwards.
//! Field names serialize in camelCase, the shape the viewer consumes.

use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type tag reserved for containers.
pub const CONTAINER_TYPE: &str = "container";

/// Label for items that are not inside any container.
pub const NO_CONTAINER_LABEL: &str = "No Container";

/// Label for items whose container id matches no known container.
pub const UNKNOWN_CONTAINER_LABEL: &str = "Unknown Container";

/// Name given to containers exported without one.
pub const UNNAMED_CONTAINER: &str = "Unnamed Container";

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores, keyed by their export codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "dex")]
    Dexterity,
    #[serde(rename = "con")]
    Constitution,
    #[serde(rename = "int")]
    Intelligence,
    #[serde(rename = "wis")]
    Wisdom,
    #[serde(rename = "cha")]
    Charisma,
}

impl Ability {
    /// Export code, e.g. `"str"`.
    pub fn code(&self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    pub fn from_code(code: &str) -> Option<Ability> {
        Ability::all().into_iter().find(|a| a.code() == code)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// One ability score with its derived modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScore {
    pub value: i32,
    pub modifier: i32,
    /// Proficient in this ability's saving throw.
    pub proficient: bool,
}

impl AbilityScore {
    /// Build a score, deriving the modifier.
    pub fn new(value: i32, proficient: bool) -> Self {
        Self {
            value,
            modifier: rules::ability_modifier(value),
            proficient,
        }
    }
}

/// Scores for the abilities present in the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityScores(pub BTreeMap<Ability, AbilityScore>);

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> Option<&AbilityScore> {
        self.0.get(&ability)
    }

    /// Modifier for an ability, 0 when the ability was not exported.
    pub fn modifier(&self, ability: Ability) -> i32 {
        self.get(ability).map(|s| s.modifier).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, &AbilityScore)> {
        self.0.iter().map(|(a, s)| (*a, s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills, keyed by their export codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    #[serde(rename = "acr")]
    Acrobatics,
    #[serde(rename = "ani")]
    AnimalHandling,
    #[serde(rename = "arc")]
    Arcana,
    #[serde(rename = "ath")]
    Athletics,
    #[serde(rename = "dec")]
    Deception,
    #[serde(rename = "his")]
    History,
    #[serde(rename = "ins")]
    Insight,
    #[serde(rename = "itm")]
    Intimidation,
    #[serde(rename = "inv")]
    Investigation,
    #[serde(rename = "med")]
    Medicine,
    #[serde(rename = "nat")]
    Nature,
    #[serde(rename = "prc")]
    Perception,
    #[serde(rename = "prf")]
    Performance,
    #[serde(rename = "per")]
    Persuasion,
    #[serde(rename = "rel")]
    Religion,
    #[serde(rename = "slt")]
    SleightOfHand,
    #[serde(rename = "ste")]
    Stealth,
    #[serde(rename = "sur")]
    Survival,
}

impl Skill {
    pub fn code(&self) -> &'static str {
        match self {
            Skill::Acrobatics => "acr",
            Skill::AnimalHandling => "ani",
            Skill::Arcana => "arc",
            Skill::Athletics => "ath",
            Skill::Deception => "dec",
            Skill::History => "his",
            Skill::Insight => "ins",
            Skill::Intimidation => "itm",
            Skill::Investigation => "inv",
            Skill::Medicine => "med",
            Skill::Nature => "nat",
            Skill::Perception => "prc",
            Skill::Performance => "prf",
            Skill::Persuasion => "per",
            Skill::Religion => "rel",
            Skill::SleightOfHand => "slt",
            Skill::Stealth => "ste",
            Skill::Survival => "sur",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Acrobatics => "Acrobatics",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Arcana => "Arcana",
            Skill::Athletics => "Athletics",
            Skill::Deception => "Deception",
            Skill::History => "History",
            Skill::Insight => "Insight",
            Skill::Intimidation => "Intimidation",
            Skill::Investigation => "Investigation",
            Skill::Medicine => "Medicine",
            Skill::Nature => "Nature",
            Skill::Perception => "Perception",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
            Skill::Religion => "Religion",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Survival => "Survival",
        }
    }

    pub fn all() -> [Skill; 18] {
        [
            Skill::Acrobatics,
            Skill::AnimalHandling,
            Skill::Arcana,
            Skill::Athletics,
            Skill::Deception,
            Skill::History,
            Skill::Insight,
            Skill::Intimidation,
            Skill::Investigation,
            Skill::Medicine,
            Skill::Nature,
            Skill::Perception,
            Skill::Performance,
            Skill::Persuasion,
            Skill::Religion,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Survival,
        ]
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A skill with its computed check total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub total: i32,
    /// Ability the export assigns to this skill; `None` if it named none we
    /// recognise, in which case no ability modifier applies.
    pub governing_ability: Option<Ability>,
    pub proficient: bool,
    pub expertise: bool,
    pub misc_bonus: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skills(pub BTreeMap<Skill, SkillEntry>);

impl Skills {
    pub fn get(&self, skill: Skill) -> Option<&SkillEntry> {
        self.0.get(&skill)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Skill, &SkillEntry)> {
        self.0.iter().map(|(k, e)| (*k, e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Vitals
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
    pub temp: i32,
}

// ============================================================================
// Spellcasting
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellComponents {
    pub verbal: bool,
    pub somatic: bool,
    pub material: bool,
    /// Free-text material description.
    pub materials: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub name: String,
    /// 0 for cantrips.
    pub level: u8,
    pub school: String,
    pub prepared: bool,
    pub ritual: bool,
    /// HTML as exported; not sanitized.
    pub description: String,
    pub components: SpellComponents,
    pub range: String,
    pub duration: String,
    pub casting_time: String,
    pub concentration: bool,
}

impl Spell {
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub level: u8,
    pub current: i32,
    pub max: i32,
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    /// Free-form type tag from the export (`weapon`, `equipment`, `loot`, ...).
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i32,
    pub weight: Option<f64>,
    pub description: String,
    pub equipped: bool,
    pub attunement: bool,
    pub rarity: String,
    pub properties: Vec<String>,
    /// Holding container, or `None` for top-level items. A dangling id is kept
    /// as-is; see [`CharacterRecord::container_label`].
    pub container_id: Option<String>,
}

impl Item {
    /// Weight of the whole stack; absent weight counts as zero and a zero
    /// quantity counts as one.
    pub fn stack_weight(&self) -> f64 {
        let quantity = if self.quantity == 0 { 1 } else { self.quantity };
        self.weight.unwrap_or(0.0) * f64::from(quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proficiencies {
    pub armor: Vec<String>,
    pub weapons: Vec<String>,
    /// Not read from exports yet; always empty.
    pub tools: Vec<String>,
    pub languages: Vec<String>,
    pub saving_throws: Vec<Ability>,
}

// ============================================================================
// Character
// ============================================================================

/// A character sheet normalized from an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub name: String,
    /// Always derived from experience points.
    pub level: u8,
    pub race: String,
    pub class: String,
    pub background: String,
    pub alignment: String,

    pub hp: Option<HitPoints>,
    pub armor_class: Option<i32>,
    /// Walking speed in feet.
    pub speed: Option<i32>,

    /// `None` when the export has no ability section at all.
    pub ability_scores: Option<AbilityScores>,
    pub skills: Option<Skills>,

    pub spells: Vec<Spell>,
    pub spell_slots: Vec<SpellSlot>,

    pub items: Vec<Item>,
    pub containers: Vec<Container>,

    pub proficiencies: Proficiencies,
    pub features: Vec<Feature>,
}

impl CharacterRecord {
    pub fn proficiency_bonus(&self) -> i32 {
        rules::proficiency_bonus(self.level)
    }

    /// Modifier for an ability, 0 when it was not exported.
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.ability_scores
            .as_ref()
            .map(|scores| scores.modifier(ability))
            .unwrap_or(0)
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    /// Display label for an item's container reference.
    pub fn container_label(&self, container_id: Option<&str>) -> &str {
        match container_id {
            None => NO_CONTAINER_LABEL,
            Some(id) => self
                .container(id)
                .map(|c| c.name.as_str())
                .unwrap_or(UNKNOWN_CONTAINER_LABEL),
        }
    }

    pub fn equipped_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.equipped)
    }
}
