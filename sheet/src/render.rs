//! Plain-text rendering of sheets, spellbooks and inventories.

use sheet_core::inventory::{ContainerGroup, PartyInventory};
use sheet_core::spellbook::SpellLevelGroup;
use sheet_core::{CharacterRecord, StoredCharacter};
use std::fmt::Write;

fn signed(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        format!("{value}")
    }
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

/// One line per stored character.
pub fn character_list(characters: &[StoredCharacter]) -> String {
    if characters.is_empty() {
        return "No characters stored.\n".to_string();
    }
    let mut out = String::new();
    for c in characters {
        let _ = writeln!(
            out,
            "{}  {}  Level {} {} {}  ({})",
            c.id,
            c.name,
            c.data.level,
            or_dash(&c.data.race),
            or_dash(&c.data.class),
            c.uploaded_at
        );
    }
    out
}

/// Summary sheet: identity, vitals, abilities, skills and proficiencies.
pub fn sheet(name: &str, record: &CharacterRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{name}");
    let _ = writeln!(
        out,
        "Level {} {} {}  ({})",
        record.level,
        or_dash(&record.race),
        or_dash(&record.class),
        or_dash(&record.background)
    );
    if !record.alignment.is_empty() {
        let _ = writeln!(out, "Alignment: {}", record.alignment);
    }

    let hp = match record.hp {
        Some(hp) if hp.temp > 0 => format!("{}/{} (+{})", hp.value, hp.max, hp.temp),
        Some(hp) => format!("{}/{}", hp.value, hp.max),
        None => "-".to_string(),
    };
    let ac = record.armor_class.map(|ac| ac.to_string()).unwrap_or_else(|| "-".into());
    let speed = record
        .speed
        .map(|s| format!("{s} ft"))
        .unwrap_or_else(|| "-".into());
    let _ = writeln!(
        out,
        "HP: {hp}  AC: {ac}  Speed: {speed}  Prof: {}",
        signed(record.proficiency_bonus())
    );

    if let Some(scores) = &record.ability_scores {
        let _ = writeln!(out, "\nAbilities");
        for (ability, score) in scores.iter() {
            let save = if score.proficient { " (save)" } else { "" };
            let _ = writeln!(
                out,
                "  {} {:>2} ({}){save}",
                ability.abbreviation(),
                score.value,
                signed(score.modifier)
            );
        }
    }

    if let Some(skills) = &record.skills {
        let _ = writeln!(out, "\nSkills");
        for (skill, entry) in skills.iter() {
            let marker = if entry.expertise {
                "**"
            } else if entry.proficient {
                "*"
            } else {
                ""
            };
            let _ = writeln!(out, "  {}{marker} {}", skill.name(), signed(entry.total));
        }
    }

    let prof = &record.proficiencies;
    let lists = [
        ("Armor", &prof.armor),
        ("Weapons", &prof.weapons),
        ("Languages", &prof.languages),
    ];
    if lists.iter().any(|(_, l)| !l.is_empty()) {
        let _ = writeln!(out, "\nProficiencies");
        for (label, list) in lists {
            if !list.is_empty() {
                let _ = writeln!(out, "  {label}: {}", list.join(", "));
            }
        }
    }

    if !record.features.is_empty() {
        let _ = writeln!(out, "\nFeatures");
        for feature in &record.features {
            let _ = writeln!(out, "  {}", feature.name);
        }
    }

    out
}

pub fn spellbook(record: &CharacterRecord, groups: &[SpellLevelGroup<'_>]) -> String {
    let mut out = String::new();
    if !record.spell_slots.is_empty() {
        let slots: Vec<String> = record
            .spell_slots
            .iter()
            .map(|s| format!("{}: {}/{}", s.level, s.current, s.max))
            .collect();
        let _ = writeln!(out, "Slots  {}", slots.join("  "));
    }
    if groups.is_empty() {
        let _ = writeln!(out, "No spells.");
        return out;
    }
    for group in groups {
        let _ = writeln!(out, "{}", group.label());
        for spell in &group.spells {
            let mut tags = Vec::new();
            if spell.prepared {
                tags.push("prepared");
            }
            if spell.ritual {
                tags.push("ritual");
            }
            if spell.concentration {
                tags.push("concentration");
            }
            let tags = if tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", tags.join(", "))
            };
            let _ = writeln!(out, "  {} ({}){tags}", spell.name, or_dash(&spell.school));
        }
    }
    out
}

fn write_groups(out: &mut String, groups: &[ContainerGroup<'_>], indent: &str) {
    for group in groups {
        let _ = writeln!(out, "{indent}{} ({} lb)", group.label, group.weight());
        for item in &group.items {
            let equipped = if item.equipped { " [equipped]" } else { "" };
            let _ = writeln!(
                out,
                "{indent}  {} x{} ({}){equipped}",
                item.name, item.quantity, item.item_type
            );
        }
    }
}

pub fn inventory(groups: &[ContainerGroup<'_>]) -> String {
    let mut out = String::new();
    if groups.is_empty() {
        let _ = writeln!(out, "No items.");
    }
    write_groups(&mut out, groups, "");
    out
}

pub fn party(inventory: &PartyInventory<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Party: {} items, {} lb",
        inventory.total_items, inventory.total_weight
    );
    if !inventory.item_types.is_empty() {
        let _ = writeln!(out, "Types: {}", inventory.item_types.join(", "));
    }
    for character in &inventory.characters {
        let _ = writeln!(out, "\n{} ({} items)", character.name, character.item_count());
        write_groups(&mut out, &character.groups, "  ");
    }
    out
}
