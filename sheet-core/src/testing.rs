//! Testing utilities for building export documents.
//!
//! Exports are large and mostly noise; these builders produce the smallest
//! JSON that exercises one behavior, for unit and integration tests:
//! - `SourceBuilder` for the actor document
//! - `EntryBuilder` for entries of its `items` array
//! - `sample_party` for store and inventory scenarios
//!
//! Builders panic on misuse rather than returning `Result`.

use serde_json::{json, Map, Value};

/// Fluent builder for a whole export.
#[derive(Debug, Clone)]
pub struct SourceBuilder {
    name: String,
    system: Map<String, Value>,
    items: Vec<Value>,
}

impl SourceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system: Map::new(),
            items: Vec::new(),
        }
    }

    /// Set the experience total.
    pub fn xp(mut self, xp: u32) -> Self {
        self.details_entry("xp", json!({ "value": xp }));
        self
    }

    /// Merge fields into `system.details`.
    pub fn details(mut self, details: Value) -> Self {
        for (key, value) in into_object(details) {
            self.details_entry(&key, value);
        }
        self
    }

    /// Add an ability block. `proficient` is the raw saving-throw flag.
    pub fn ability(mut self, code: &str, value: i32, proficient: u8) -> Self {
        self.section("abilities")
            .insert(code.to_string(), json!({ "value": value, "proficient": proficient }));
        self
    }

    /// Add a skill block. `tier` is the raw 0/1/2 proficiency value.
    pub fn skill(mut self, code: &str, ability: &str, tier: u8, check: Option<&str>) -> Self {
        let mut block = json!({ "value": tier, "ability": ability });
        if let Some(check) = check {
            block["bonuses"] = json!({ "check": check });
        }
        self.section("skills").insert(code.to_string(), block);
        self
    }

    pub fn hp(mut self, value: i32, max: i32) -> Self {
        self.attribute("hp", json!({ "value": value, "max": max, "temp": 0 }));
        self
    }

    pub fn armor_class(mut self, flat: i32) -> Self {
        self.attribute("ac", json!({ "flat": flat }));
        self
    }

    pub fn speed(mut self, walk: i32) -> Self {
        self.attribute("movement", json!({ "walk": walk }));
        self
    }

    /// Replace `system.spells` (slot counts) wholesale.
    pub fn spell_slots(mut self, slots: Value) -> Self {
        self.system.insert("spells".to_string(), slots);
        self
    }

    /// Replace `system.traits` wholesale.
    pub fn traits(mut self, traits: Value) -> Self {
        self.system.insert("traits".to_string(), traits);
        self
    }

    pub fn entry(mut self, entry: EntryBuilder) -> Self {
        self.items.push(entry.build());
        self
    }

    pub fn build(self) -> Value {
        json!({
            "name": self.name,
            "system": Value::Object(self.system),
            "items": self.items,
        })
    }

    fn section(&mut self, key: &str) -> &mut Map<String, Value> {
        let slot = self
            .system
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match slot {
            Value::Object(map) => map,
            _ => panic!("system.{key} is not an object"),
        }
    }

    fn details_entry(&mut self, key: &str, value: Value) {
        self.section("details").insert(key.to_string(), value);
    }

    fn attribute(&mut self, key: &str, value: Value) {
        self.section("attributes").insert(key.to_string(), value);
    }
}

/// Fluent builder for one entry of the `items` array.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    id: String,
    name: String,
    kind: String,
    system: Map<String, Value>,
}

impl EntryBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            system: Map::new(),
        }
    }

    /// A spell with a level; the id is derived from the name.
    pub fn spell(name: &str, level: u8) -> Self {
        let mut entry = Self::new(slug(name), name, "spell");
        entry.system.insert("level".to_string(), json!(level));
        entry
    }

    /// A piece of equipment; the id is derived from the name.
    pub fn item(name: &str, kind: &str) -> Self {
        Self::new(slug(name), name, kind)
    }

    pub fn school_plain(mut self, school: &str) -> Self {
        self.system.insert("school".to_string(), json!(school));
        self
    }

    pub fn school_nested(mut self, school: &str) -> Self {
        self.system
            .insert("school".to_string(), json!({ "value": school }));
        self
    }

    pub fn quantity(mut self, quantity: i32) -> Self {
        self.system.insert("quantity".to_string(), json!(quantity));
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.system
            .insert("weight".to_string(), json!({ "value": weight }));
        self
    }

    pub fn equipped(mut self) -> Self {
        self.system.insert("equipped".to_string(), json!(true));
        self
    }

    pub fn container(mut self, container_id: &str) -> Self {
        self.system
            .insert("container".to_string(), json!(container_id));
        self
    }

    /// Merge arbitrary fields into the entry's `system` block.
    pub fn system(mut self, fields: Value) -> Self {
        self.system.extend(into_object(fields));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "_id": self.id,
            "name": self.name,
            "type": self.kind,
            "system": Value::Object(self.system),
        })
    }
}

/// Three exports with overlapping inventories.
pub fn sample_party() -> Vec<Value> {
    vec![
        SourceBuilder::new("Thorin")
            .xp(2_700)
            .ability("str", 16, 1)
            .hp(38, 38)
            .entry(EntryBuilder::new("pack", "Backpack", "container"))
            .entry(EntryBuilder::item("Warhammer", "weapon").weight(2.0).equipped())
            .entry(
                EntryBuilder::item("Rations", "consumable")
                    .quantity(5)
                    .weight(2.0)
                    .container("pack"),
            )
            .build(),
        SourceBuilder::new("Elara")
            .xp(6_500)
            .ability("int", 18, 1)
            .entry(EntryBuilder::spell("Magic Missile", 1))
            .entry(EntryBuilder::item("Quarterstaff", "weapon").weight(4.0).equipped())
            .entry(EntryBuilder::item("Spellbook", "loot").weight(3.0))
            .build(),
        SourceBuilder::new("Pip")
            .entry(
                EntryBuilder::item("Thieves' Tools", "tool")
                    .weight(1.0)
                    .container("missing"),
            )
            .build(),
    ]
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shape() {
        let doc = SourceBuilder::new("Aria")
            .xp(900)
            .ability("str", 14, 1)
            .skill("ath", "str", 1, Some("+1"))
            .entry(EntryBuilder::spell("Fire Bolt", 0).school_plain("evo"))
            .build();

        assert_eq!(doc["name"], "Aria");
        assert_eq!(doc["system"]["details"]["xp"]["value"], 900);
        assert_eq!(doc["system"]["abilities"]["str"]["proficient"], 1);
        assert_eq!(doc["system"]["skills"]["ath"]["bonuses"]["check"], "+1");
        assert_eq!(doc["items"][0]["_id"], "fire-bolt");
        assert_eq!(doc["items"][0]["type"], "spell");
        assert_eq!(doc["items"][0]["system"]["school"], "evo");
    }

    #[test]
    fn test_details_merge_keeps_xp() {
        let doc = SourceBuilder::new("Aria")
            .xp(300)
            .details(json!({ "alignment": "Neutral" }))
            .build();
        assert_eq!(doc["system"]["details"]["xp"]["value"], 300);
        assert_eq!(doc["system"]["details"]["alignment"], "Neutral");
    }

    #[test]
    fn test_sample_party() {
        let party = sample_party();
        assert_eq!(party.len(), 3);
        assert_eq!(party[2]["name"], "Pip");
    }
}
