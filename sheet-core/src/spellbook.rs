//! Spell lists grouped by level.

use crate::character::{CharacterRecord, Spell};
use std::collections::BTreeMap;

/// Which spells to keep by preparation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreparedFilter {
    #[default]
    All,
    Prepared,
    Unprepared,
}

impl PreparedFilter {
    fn accepts(&self, spell: &Spell) -> bool {
        match self {
            PreparedFilter::All => true,
            PreparedFilter::Prepared => spell.prepared,
            PreparedFilter::Unprepared => !spell.prepared,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpellFilter {
    /// Keep only this spell level.
    pub level: Option<u8>,
    pub prepared: PreparedFilter,
}

impl SpellFilter {
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_prepared(mut self, prepared: PreparedFilter) -> Self {
        self.prepared = prepared;
        self
    }

    pub fn accepts(&self, spell: &Spell) -> bool {
        self.level.map_or(true, |level| spell.level == level) && self.prepared.accepts(spell)
    }
}

/// Spells of one level, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpellLevelGroup<'a> {
    pub level: u8,
    pub spells: Vec<&'a Spell>,
}

impl SpellLevelGroup<'_> {
    /// "Cantrip" for level 0, otherwise "Level N".
    pub fn label(&self) -> String {
        level_label(self.level)
    }
}

pub fn level_label(level: u8) -> String {
    if level == 0 {
        "Cantrip".to_string()
    } else {
        format!("Level {level}")
    }
}

/// Group a character's spells by ascending level. Levels with no matching
/// spells are left out.
pub fn spellbook<'a>(record: &'a CharacterRecord, filter: &SpellFilter) -> Vec<SpellLevelGroup<'a>> {
    let mut by_level: BTreeMap<u8, Vec<&'a Spell>> = BTreeMap::new();
    for spell in record.spells.iter().filter(|s| filter.accepts(s)) {
        by_level.entry(spell.level).or_default().push(spell);
    }

    by_level
        .into_iter()
        .map(|(level, spells)| SpellLevelGroup { level, spells })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::import_value;
    use crate::testing::{EntryBuilder, SourceBuilder};
    use serde_json::json;

    fn caster() -> CharacterRecord {
        let raw = SourceBuilder::new("Elara")
            .entry(EntryBuilder::spell("Shield", 1).system(json!({ "preparation": { "prepared": true } })))
            .entry(EntryBuilder::spell("Fire Bolt", 0))
            .entry(EntryBuilder::spell("Fireball", 3).system(json!({ "preparation": { "prepared": true } })))
            .entry(EntryBuilder::spell("Mage Armor", 1))
            .entry(EntryBuilder::spell("Light", 0))
            .build();
        import_value(raw).unwrap()
    }

    #[test]
    fn test_groups_sorted_by_level_source_order_within() {
        let record = caster();
        let groups = spellbook(&record, &SpellFilter::default());

        let levels: Vec<_> = groups.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![0, 1, 3]);

        let cantrips: Vec<_> = groups[0].spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(cantrips, vec!["Fire Bolt", "Light"]);
        assert_eq!(groups[0].label(), "Cantrip");

        let first: Vec<_> = groups[1].spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(first, vec!["Shield", "Mage Armor"]);
        assert_eq!(groups[1].label(), "Level 1");
    }

    #[test]
    fn test_prepared_filter_drops_empty_levels() {
        let record = caster();
        let filter = SpellFilter::default().with_prepared(PreparedFilter::Prepared);
        let groups = spellbook(&record, &filter);
        let levels: Vec<_> = groups.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![1, 3]);

        let filter = SpellFilter::default().with_prepared(PreparedFilter::Unprepared);
        let total: usize = spellbook(&record, &filter).iter().map(|g| g.spells.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_level_filter() {
        let record = caster();
        let groups = spellbook(&record, &SpellFilter::default().with_level(3));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].spells[0].name, "Fireball");

        assert!(spellbook(&record, &SpellFilter::default().with_level(9)).is_empty());
    }
}
