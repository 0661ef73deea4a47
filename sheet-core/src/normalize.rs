//! Export-to-record normalization.
//!
//! [`normalize`] is a pure function from a parsed [`SourceDocument`] to a
//! [`CharacterRecord`]. It cannot fail: every missing or malformed field has
//! a default. The only failure in the whole pipeline is an input that is not
//! a JSON object, reported by the `import_*` helpers before normalization
//! starts.

use crate::character::{
    Ability, AbilityScore, AbilityScores, CharacterRecord, Container, Feature, HitPoints, Item,
    Proficiencies, Skill, SkillEntry, Skills, Spell, SpellComponents, SpellSlot,
    UNNAMED_CONTAINER,
};
use crate::classify::{classify, Buckets, Descriptor};
use crate::rules::{self, ProficiencyTier};
use crate::source::{ActorSystem, Flag, SourceDocument, SourceEntry, Valued};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from reading an export.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file: not valid JSON ({0})")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid file: expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default score for an ability block that has no value.
const DEFAULT_ABILITY_SCORE: i32 = 10;

/// Highest spell slot level.
const MAX_SPELL_LEVEL: u8 = 9;

// ============================================================================
// Entry points
// ============================================================================

/// Parse export text and normalize it.
pub fn import_str(text: &str) -> Result<CharacterRecord, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    import_value(value)
}

/// Normalize an already-parsed export.
pub fn import_value(value: Value) -> Result<CharacterRecord, ImportError> {
    let doc = SourceDocument::from_value(value)?;
    Ok(normalize(&doc))
}

/// Read and normalize an export file.
pub async fn import_file(path: impl AsRef<Path>) -> Result<CharacterRecord, ImportError> {
    let content = fs::read_to_string(path).await?;
    import_str(&content)
}

/// Build a character record from an export.
pub fn normalize(doc: &SourceDocument) -> CharacterRecord {
    let buckets = classify(&doc.items);
    let system = doc.system();

    let level = extract_level(system);
    let ability_scores = extract_ability_scores(system);
    let skills = extract_skills(system, ability_scores.as_ref(), level);

    CharacterRecord {
        name: doc.name.clone().unwrap_or_default(),
        level,
        race: extract_descriptor(system, &buckets, Descriptor::Race),
        class: extract_descriptor(system, &buckets, Descriptor::Class),
        background: extract_descriptor(system, &buckets, Descriptor::Background),
        alignment: extract_alignment(system),
        hp: extract_hp(system),
        armor_class: extract_armor_class(system),
        speed: extract_speed(system),
        ability_scores,
        skills,
        spells: buckets.spells.iter().map(|e| extract_spell(e)).collect(),
        spell_slots: extract_spell_slots(system),
        items: buckets.items.iter().map(|e| extract_item(e)).collect(),
        containers: buckets.containers.iter().filter_map(|e| extract_container(e)).collect(),
        proficiencies: extract_proficiencies(system),
        features: buckets.feats.iter().map(|e| extract_feature(e)).collect(),
    }
}

// ============================================================================
// Numeric helpers
// ============================================================================

/// Truncate a JSON number to an `i32`, saturating at the bounds.
fn to_i32(n: f64) -> i32 {
    // `as` saturates and maps NaN to 0.
    n as i32
}

/// Leading-integer parse in the manner of the export's own bonus fields:
/// `"+2"` is 2, `"-1"` is -1, `"3 (magic)"` is 3, `"@prof"` is 0. Values past
/// the `i32` range saturate.
fn parse_bonus(raw: &Value) -> i32 {
    match raw {
        Value::Number(n) => n.as_f64().map(to_i32).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.as_bytes().first() {
                Some(b'-') => (-1i64, &s[1..]),
                Some(b'+') => (1, &s[1..]),
                _ => (1, s),
            };
            let magnitude = digits
                .bytes()
                .take_while(u8::is_ascii_digit)
                .fold(0i64, |acc, b| {
                    acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
                });
            (sign * magnitude).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        }
        _ => 0,
    }
}

// ============================================================================
// Identity and descriptors
// ============================================================================

fn extract_level(system: Option<&ActorSystem>) -> u8 {
    let xp = system
        .and_then(|s| s.details.as_ref())
        .and_then(|d| d.xp.as_ref())
        .and_then(|xp| xp.value)
        .unwrap_or(0.0);
    // Negative or NaN totals saturate to 0 and land on level 1.
    rules::level_for_xp(xp as u32)
}

fn extract_descriptor(
    system: Option<&ActorSystem>,
    buckets: &Buckets<'_>,
    descriptor: Descriptor,
) -> String {
    let details = system.and_then(|s| s.details.as_ref());
    let reference = details.and_then(|d| match descriptor {
        Descriptor::Race => d.race.as_ref(),
        Descriptor::Class => d.original_class.as_ref(),
        Descriptor::Background => d.background.as_ref(),
    });
    buckets.descriptor_name(reference, descriptor)
}

fn extract_alignment(system: Option<&ActorSystem>) -> String {
    system
        .and_then(|s| s.details.as_ref())
        .and_then(|d| d.alignment.clone())
        .unwrap_or_default()
}

// ============================================================================
// Vitals
// ============================================================================

fn extract_hp(system: Option<&ActorSystem>) -> Option<HitPoints> {
    let hp = system?.attributes.as_ref()?.hp.as_ref()?;
    let value = hp.value.map(to_i32).unwrap_or(0);
    Some(HitPoints {
        value,
        max: hp.max.map(to_i32).unwrap_or(value),
        temp: hp.temp.map(to_i32).unwrap_or(0),
    })
}

fn extract_armor_class(system: Option<&ActorSystem>) -> Option<i32> {
    system?.attributes.as_ref()?.ac.as_ref()?.flat.map(to_i32)
}

fn extract_speed(system: Option<&ActorSystem>) -> Option<i32> {
    system?.attributes.as_ref()?.movement.as_ref()?.walk.map(to_i32)
}

// ============================================================================
// Abilities and skills
// ============================================================================

fn extract_ability_scores(system: Option<&ActorSystem>) -> Option<AbilityScores> {
    let abilities = system?.abilities.as_ref()?;

    let scores: AbilityScores = AbilityScores(
        Ability::all()
            .into_iter()
            .filter_map(|ability| {
                let block = abilities.get(ability.code())?;
                let value = block.value.map(to_i32).unwrap_or(DEFAULT_ABILITY_SCORE);
                let proficient = block.proficient == Some(1.0);
                Some((ability, AbilityScore::new(value, proficient)))
            })
            .collect(),
    );

    (!scores.is_empty()).then_some(scores)
}

fn extract_skills(
    system: Option<&ActorSystem>,
    ability_scores: Option<&AbilityScores>,
    level: u8,
) -> Option<Skills> {
    let source = system?.skills.as_ref()?;

    let skills = Skills(
        Skill::all()
            .into_iter()
            .filter_map(|skill| {
                let block = source.get(skill.code())?;
                // The export names the governing ability per character, which
                // allows house-rule remaps; no fixed skill-to-ability table.
                let governing_ability = block.ability.as_deref().and_then(Ability::from_code);
                let ability_mod = match (governing_ability, ability_scores) {
                    (Some(ability), Some(scores)) => scores.modifier(ability),
                    _ => 0,
                };
                let tier = ProficiencyTier::from_flag(block.value);
                let misc_bonus = block
                    .bonuses
                    .as_ref()
                    .and_then(|b| b.check.as_ref())
                    .map(parse_bonus)
                    .unwrap_or(0);

                Some((
                    skill,
                    SkillEntry {
                        total: rules::skill_total(ability_mod, tier, level, misc_bonus),
                        governing_ability,
                        proficient: tier.is_proficient(),
                        expertise: tier.is_expertise(),
                        misc_bonus,
                    },
                ))
            })
            .collect(),
    );

    (!skills.is_empty()).then_some(skills)
}

// ============================================================================
// Spellcasting
// ============================================================================

fn extract_spell(entry: &SourceEntry) -> Spell {
    let system = entry.system();
    let components = system.components.as_ref();
    let flag = |f: Option<Flag>| f.map(|f| f.0).unwrap_or(false);

    Spell {
        name: entry.name().to_string(),
        level: system
            .level
            .map(|l| l.clamp(0.0, f64::from(MAX_SPELL_LEVEL)) as u8)
            .unwrap_or(0),
        school: system
            .school
            .clone()
            .and_then(|s| s.into_inner())
            .unwrap_or_default(),
        prepared: flag(system.preparation.as_ref().and_then(|p| p.prepared)),
        ritual: flag(components.and_then(|c| c.ritual)),
        description: system.description(),
        components: SpellComponents {
            verbal: flag(components.and_then(|c| c.vocal)),
            somatic: flag(components.and_then(|c| c.somatic)),
            material: flag(components.and_then(|c| c.material)),
            materials: components
                .and_then(|c| c.materials.as_ref())
                .and_then(|m| m.value.clone())
                .unwrap_or_default(),
        },
        range: system
            .range
            .as_ref()
            .and_then(|r| r.value.clone())
            .map(|t| t.0)
            .unwrap_or_default(),
        duration: system
            .duration
            .as_ref()
            .and_then(|d| d.value.clone())
            .map(|t| t.0)
            .unwrap_or_default(),
        casting_time: system
            .time
            .as_ref()
            .and_then(|t| t.value.clone())
            .map(|t| t.0)
            .unwrap_or_default(),
        concentration: flag(system.duration.as_ref().and_then(|d| d.concentration)),
    }
}

fn extract_spell_slots(system: Option<&ActorSystem>) -> Vec<SpellSlot> {
    let Some(slots) = system.and_then(|s| s.spells.as_ref()) else {
        return Vec::new();
    };

    (1..=MAX_SPELL_LEVEL)
        .filter_map(|level| {
            let block = slots.get(&format!("spell{level}"))?;
            // Zero is a real value ("none left"); only a missing value drops
            // the level.
            let current = block.value.map(to_i32)?;
            Some(SpellSlot {
                level,
                current,
                max: block.max.map(to_i32).unwrap_or(current),
            })
        })
        .collect()
}

// ============================================================================
// Inventory and features
// ============================================================================

fn extract_item(entry: &SourceEntry) -> Item {
    let system = entry.system();

    Item {
        name: entry.name().to_string(),
        item_type: entry.kind().unwrap_or("misc").to_string(),
        quantity: system.quantity.map(to_i32).unwrap_or(1),
        weight: system.weight.clone().and_then(|w| w.into_inner()),
        description: system.description(),
        equipped: system.equipped.map(|f| f.0).unwrap_or(false),
        // Two encodings exist; either one marks the item.
        attunement: system.attunement.as_deref() == Some("required")
            || system.attuned == Some(true),
        rarity: system.rarity.clone().unwrap_or_default(),
        properties: system
            .properties
            .clone()
            .and_then(|p| p.into_inner())
            .unwrap_or_default(),
        container_id: system.container.clone().filter(|id| !id.is_empty()),
    }
}

fn extract_container(entry: &SourceEntry) -> Option<Container> {
    let id = entry.id()?;
    let name = match entry.name() {
        "" => UNNAMED_CONTAINER,
        name => name,
    };
    Some(Container {
        id: id.to_string(),
        name: name.to_string(),
    })
}

fn extract_feature(entry: &SourceEntry) -> Feature {
    Feature {
        name: entry.name().to_string(),
        description: entry.system().description(),
    }
}

fn string_list(field: Option<&Valued<Vec<String>>>) -> Vec<String> {
    field.and_then(|v| v.value.clone()).unwrap_or_default()
}

fn extract_proficiencies(system: Option<&ActorSystem>) -> Proficiencies {
    let traits = system.and_then(|s| s.traits.as_ref());

    let saving_throws = system
        .and_then(|s| s.abilities.as_ref())
        .map(|abilities| {
            Ability::all()
                .into_iter()
                .filter(|a| {
                    abilities
                        .get(a.code())
                        .is_some_and(|block| block.proficient == Some(1.0))
                })
                .collect()
        })
        .unwrap_or_default();

    Proficiencies {
        armor: string_list(traits.and_then(|t| t.armor_prof.as_ref())),
        weapons: string_list(traits.and_then(|t| t.weapon_prof.as_ref())),
        tools: Vec::new(),
        languages: string_list(traits.and_then(|t| t.languages.as_ref())),
        saving_throws,
    }
}
