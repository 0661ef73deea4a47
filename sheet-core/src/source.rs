//! Typed view of a character export.
//!
//! Exports are loosely structured: any field may be missing, null, or of an
//! unexpected JSON type. Every field below is optional and goes through
//! [`lenient`], so a malformed field reads as absent instead of rejecting the
//! document. The only hard requirement is that the document is an object,
//! which [`SourceDocument::from_value`] checks.

use crate::normalize::ImportError;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Read a field as `T`, or `None` if it is null or of the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Read an array, keeping only the elements that parse as `T`.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(elements) => elements
            .into_iter()
            .filter_map(|element| serde_json::from_value(element).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// JavaScript-style truthiness, used where the export relies on it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Field shapes
// ============================================================================

/// The `{ "value": ... }` wrapper the export uses for most scalar fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Valued<T: DeserializeOwned> {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<T>,
}

/// A field written either bare or wrapped in `{ "value": ... }`, depending on
/// the export version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, bound(deserialize = "T: DeserializeOwned"))]
pub enum OrValued<T: DeserializeOwned> {
    Plain(T),
    Nested(Valued<T>),
}

impl<T: DeserializeOwned> OrValued<T> {
    pub fn into_inner(self) -> Option<T> {
        match self {
            OrValued::Plain(v) => Some(v),
            OrValued::Nested(wrapped) => wrapped.value,
        }
    }
}

/// Boolean flag read by truthiness, so `1` and `"yes"` both count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Flag(is_truthy(&value)))
    }
}

/// Free text that may be exported as a string or a number (ranges, casting
/// times). Anything else reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text(pub String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Text(s)),
            Value::Number(n) => Ok(Text(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected text, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// An object keyed by short codes (`str`, `acr`, `spell1`, ...). Entries that
/// do not parse as `T` are dropped individually.
#[derive(Debug, Clone)]
pub struct Keyed<T>(BTreeMap<String, T>);

impl<T> Keyed<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.get(key)
    }
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Keyed(BTreeMap::new())
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Keyed(
                map.into_iter()
                    .filter_map(|(key, value)| {
                        serde_json::from_value(value).ok().map(|parsed| (key, parsed))
                    })
                    .collect(),
            )),
            other => Err(serde::de::Error::custom(format!(
                "expected object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Short name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Document
// ============================================================================

/// Root of an export: the actor and its flat list of embedded entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub system: Option<ActorSystem>,

    /// Spells, equipment, containers, class/race/background/feat descriptors
    /// and anything else, told apart only by their `type` tag. Entries that
    /// are not objects are dropped.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Vec<SourceEntry>,
}

impl SourceDocument {
    /// Accept any JSON object. Fails only when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ImportError> {
        if !value.is_object() {
            return Err(ImportError::NotAnObject {
                found: json_kind(&value),
            });
        }
        serde_json::from_value(value).map_err(ImportError::InvalidJson)
    }

    pub fn system(&self) -> Option<&ActorSystem> {
        self.system.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorSystem {
    #[serde(default, deserialize_with = "lenient")]
    pub details: Option<Details>,

    #[serde(default, deserialize_with = "lenient")]
    pub attributes: Option<Attributes>,

    #[serde(default, deserialize_with = "lenient")]
    pub abilities: Option<Keyed<AbilityBlock>>,

    #[serde(default, deserialize_with = "lenient")]
    pub skills: Option<Keyed<SkillBlock>>,

    /// Slot counts keyed `spell1` .. `spell9`.
    #[serde(default, deserialize_with = "lenient")]
    pub spells: Option<Keyed<SlotBlock>>,

    #[serde(default, deserialize_with = "lenient")]
    pub traits: Option<Traits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Details {
    #[serde(default, deserialize_with = "lenient")]
    pub xp: Option<Valued<f64>>,

    /// References to descriptor entries. Kept raw: a reference counts as set
    /// whenever it is truthy, but only a string can match an entry id.
    #[serde(default, deserialize_with = "lenient")]
    pub race: Option<Value>,

    #[serde(default, rename = "originalClass", deserialize_with = "lenient")]
    pub original_class: Option<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub background: Option<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attributes {
    #[serde(default, deserialize_with = "lenient")]
    pub hp: Option<HpBlock>,

    #[serde(default, deserialize_with = "lenient")]
    pub ac: Option<AcBlock>,

    #[serde(default, deserialize_with = "lenient")]
    pub movement: Option<Movement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HpBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub flat: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Movement {
    #[serde(default, deserialize_with = "lenient")]
    pub walk: Option<f64>,
}

/// One ability under `system.abilities`. A set but non-object block (`"con": 7`)
/// still counts as present with no fields; an unset one (`null`, `0`, `""`) is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct AbilityBlock {
    pub value: Option<f64>,
    /// 1 = proficient in the saving throw; anything else is not.
    pub proficient: Option<f64>,
}

#[derive(Deserialize)]
struct AbilityFields {
    #[serde(default, deserialize_with = "lenient")]
    value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    proficient: Option<f64>,
}

impl<'de> Deserialize<'de> for AbilityBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => {
                let fields: AbilityFields = serde_json::from_value(Value::Object(map))
                    .map_err(serde::de::Error::custom)?;
                Ok(AbilityBlock {
                    value: fields.value,
                    proficient: fields.proficient,
                })
            }
            other if is_truthy(&other) => Ok(AbilityBlock::default()),
            other => Err(serde::de::Error::custom(format!(
                "unset ability block ({})",
                json_kind(&other)
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillBlock {
    /// Proficiency tier: 0, 1 or 2.
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ability: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bonuses: Option<SkillBonuses>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillBonuses {
    /// Usually a string such as `"+2"`; occasionally a number.
    #[serde(default, deserialize_with = "lenient")]
    pub check: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Traits {
    #[serde(default, rename = "armorProf", deserialize_with = "lenient")]
    pub armor_prof: Option<Valued<Vec<String>>>,
    #[serde(default, rename = "weaponProf", deserialize_with = "lenient")]
    pub weapon_prof: Option<Valued<Vec<String>>>,
    #[serde(default, deserialize_with = "lenient")]
    pub languages: Option<Valued<Vec<String>>>,
}

// ============================================================================
// Embedded entries
// ============================================================================

/// One element of the export's `items` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceEntry {
    #[serde(default, rename = "_id", deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub system: Option<EntrySystem>,
}

impl SourceEntry {
    /// Type tag, treating an empty tag as missing.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref().filter(|k| !k.is_empty())
    }

    /// Entry id, treating an empty id as missing.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Name, or an empty string.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn system(&self) -> &EntrySystem {
        static EMPTY: EntrySystem = EntrySystem::EMPTY;
        self.system.as_ref().unwrap_or(&EMPTY)
    }
}

/// The `system` block of an entry. Spells and equipment share this shape;
/// each reader uses the fields it cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntrySystem {
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<Valued<String>>,

    // Spell fields
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub school: Option<OrValued<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub preparation: Option<Preparation>,
    #[serde(default, deserialize_with = "lenient")]
    pub components: Option<ComponentsBlock>,
    #[serde(default, deserialize_with = "lenient")]
    pub range: Option<Valued<Text>>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<DurationBlock>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<Valued<Text>>,

    // Equipment fields
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub weight: Option<OrValued<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub equipped: Option<Flag>,
    #[serde(default, deserialize_with = "lenient")]
    pub attunement: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attuned: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub rarity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Option<OrValued<Vec<String>>>,
    #[serde(default, deserialize_with = "lenient")]
    pub container: Option<String>,
}

impl EntrySystem {
    const EMPTY: EntrySystem = EntrySystem {
        description: None,
        level: None,
        school: None,
        preparation: None,
        components: None,
        range: None,
        duration: None,
        time: None,
        quantity: None,
        weight: None,
        equipped: None,
        attunement: None,
        attuned: None,
        rarity: None,
        properties: None,
        container: None,
    };

    /// Description HTML, or an empty string.
    pub fn description(&self) -> String {
        self.description
            .as_ref()
            .and_then(|d| d.value.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preparation {
    #[serde(default, deserialize_with = "lenient")]
    pub prepared: Option<Flag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentsBlock {
    /// Verbal; the export calls it `vocal`.
    #[serde(default, deserialize_with = "lenient")]
    pub vocal: Option<Flag>,
    #[serde(default, deserialize_with = "lenient")]
    pub somatic: Option<Flag>,
    #[serde(default, deserialize_with = "lenient")]
    pub material: Option<Flag>,
    #[serde(default, deserialize_with = "lenient")]
    pub ritual: Option<Flag>,
    #[serde(default, deserialize_with = "lenient")]
    pub materials: Option<Valued<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DurationBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<Text>,
    #[serde(default, deserialize_with = "lenient")]
    pub concentration: Option<Flag>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_objects() {
        for value in [json!(null), json!([1, 2]), json!("Aria"), json!(3)] {
            let err = SourceDocument::from_value(value).unwrap_err();
            assert!(matches!(err, ImportError::NotAnObject { .. }));
        }
    }

    #[test]
    fn test_empty_object_is_accepted() {
        let doc = SourceDocument::from_value(json!({})).unwrap();
        assert!(doc.name.is_none());
        assert!(doc.system.is_none());
        assert!(doc.items.is_empty());
    }

    #[test]
    fn test_wrong_types_read_as_absent() {
        let doc = SourceDocument::from_value(json!({
            "name": 42,
            "system": {
                "details": { "xp": { "value": "lots" }, "alignment": ["lawful"] },
                "attributes": "none",
                "abilities": { "str": { "value": 14 }, "dex": null, "con": 7 }
            },
            "items": "not a list"
        }))
        .unwrap();

        assert!(doc.name.is_none());
        let system = doc.system().unwrap();
        let details = system.details.as_ref().unwrap();
        assert!(details.xp.as_ref().unwrap().value.is_none());
        assert!(details.alignment.is_none());
        assert!(system.attributes.is_none());

        let abilities = system.abilities.as_ref().unwrap();
        assert_eq!(abilities.get("str").unwrap().value, Some(14.0));
        assert!(abilities.get("dex").is_none());
        assert!(doc.items.is_empty());
    }

    #[test]
    fn test_set_non_object_ability_block_is_kept_empty() {
        let abilities: Keyed<AbilityBlock> = serde_json::from_value(json!({
            "con": 7, "int": "high", "wis": 0, "cha": "", "dex": null
        }))
        .unwrap();

        let con = abilities.get("con").unwrap();
        assert!(con.value.is_none());
        assert!(con.proficient.is_none());
        assert!(abilities.get("int").is_some());
        assert!(abilities.get("wis").is_none());
        assert!(abilities.get("cha").is_none());
        assert!(abilities.get("dex").is_none());
    }

    #[test]
    fn test_non_object_entries_are_dropped() {
        let doc = SourceDocument::from_value(json!({
            "items": [null, 3, { "_id": "a", "name": "Rope", "type": "loot" }, "x"]
        }))
        .unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].id(), Some("a"));
        assert_eq!(doc.items[0].kind(), Some("loot"));
    }

    #[test]
    fn test_or_valued_accepts_both_forms() {
        let plain: OrValued<String> = serde_json::from_value(json!("evocation")).unwrap();
        let nested: OrValued<String> =
            serde_json::from_value(json!({ "value": "evocation" })).unwrap();
        assert_eq!(plain.into_inner().as_deref(), Some("evocation"));
        assert_eq!(nested.into_inner().as_deref(), Some("evocation"));
    }

    #[test]
    fn test_text_accepts_numbers() {
        let range: Valued<Text> = serde_json::from_value(json!({ "value": 60 })).unwrap();
        assert_eq!(range.value, Some(Text("60".to_string())));
        let range: Valued<Text> = serde_json::from_value(json!({ "value": {} })).unwrap();
        assert_eq!(range.value, None);
    }

    #[test]
    fn test_flag_truthiness() {
        let flags: Vec<Flag> =
            serde_json::from_value(json!([true, false, 1, 0, "", "x", null])).unwrap();
        let bools: Vec<bool> = flags.into_iter().map(|f| f.0).collect();
        assert_eq!(bools, vec![true, false, true, false, false, true, false]);
    }

    #[test]
    fn test_entry_accessors_treat_empty_as_missing() {
        let entry: SourceEntry =
            serde_json::from_value(json!({ "_id": "", "type": "", "name": null })).unwrap();
        assert_eq!(entry.id(), None);
        assert_eq!(entry.kind(), None);
        assert_eq!(entry.name(), "");
        assert_eq!(entry.system().description(), "");
    }
}
