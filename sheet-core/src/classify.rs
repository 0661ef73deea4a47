//! Single pass over an export's flat `items` array.
//!
//! Each entry is sorted into exactly one bucket by its type tag, so the
//! readers downstream never rescan the array to find their own entries.

use crate::character::CONTAINER_TYPE;
use crate::source::{is_truthy, SourceEntry};
use serde_json::Value;
use tracing::debug;

/// Descriptor categories resolved by reference from the actor's details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Race,
    Class,
    Background,
}

impl Descriptor {
    /// Type tag used by entries of this category.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Descriptor::Race => "race",
            Descriptor::Class => "class",
            Descriptor::Background => "background",
        }
    }
}

/// Which bucket an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Spell,
    Feat,
    Descriptor(Descriptor),
    /// A container with an id.
    Container,
    /// Anything else with a type tag.
    Item,
    /// No type tag, or a container without an id. Appears in no bucket.
    Unclassified,
}

impl EntryKind {
    pub fn of(entry: &SourceEntry) -> Self {
        let Some(kind) = entry.kind() else {
            return EntryKind::Unclassified;
        };
        match kind {
            "spell" => EntryKind::Spell,
            "feat" => EntryKind::Feat,
            "race" => EntryKind::Descriptor(Descriptor::Race),
            "class" => EntryKind::Descriptor(Descriptor::Class),
            "background" => EntryKind::Descriptor(Descriptor::Background),
            CONTAINER_TYPE if entry.id().is_some() => EntryKind::Container,
            CONTAINER_TYPE => EntryKind::Unclassified,
            _ => EntryKind::Item,
        }
    }
}

/// Entries of one export, split by kind. Source order is kept within every
/// bucket.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    /// Every entry, in source order, for lookups by id.
    pub entries: &'a [SourceEntry],
    pub spells: Vec<&'a SourceEntry>,
    pub feats: Vec<&'a SourceEntry>,
    pub descriptors: Vec<&'a SourceEntry>,
    pub containers: Vec<&'a SourceEntry>,
    pub items: Vec<&'a SourceEntry>,
}

pub fn classify(entries: &[SourceEntry]) -> Buckets<'_> {
    let mut buckets = Buckets {
        entries,
        ..Buckets::default()
    };

    for entry in entries {
        match EntryKind::of(entry) {
            EntryKind::Spell => buckets.spells.push(entry),
            EntryKind::Feat => buckets.feats.push(entry),
            EntryKind::Descriptor(_) => buckets.descriptors.push(entry),
            EntryKind::Container => buckets.containers.push(entry),
            EntryKind::Item => buckets.items.push(entry),
            EntryKind::Unclassified => {
                debug!(name = entry.name(), kind = ?entry.kind(), "skipping unclassified entry");
            }
        }
    }

    buckets
}

impl<'a> Buckets<'a> {
    /// Name of the entry a descriptor reference points at.
    ///
    /// Exports are inconsistent about whether the reference is an id or the
    /// descriptor is simply the only entry of its type, so an entry matches
    /// if its id equals the reference or its type equals the category. The
    /// first match in source order wins. The reference must be set (truthy);
    /// an unset reference or no match gives an empty string.
    pub fn descriptor_name(&self, reference: Option<&Value>, descriptor: Descriptor) -> String {
        let Some(reference) = reference.filter(|r| is_truthy(r)) else {
            return String::new();
        };
        let wanted_id = reference.as_str();
        let tag = descriptor.type_tag();

        self.entries
            .iter()
            .find(|entry| {
                (wanted_id.is_some() && entry.id.as_deref() == wanted_id)
                    || entry.kind() == Some(tag)
            })
            .map(|entry| entry.name().to_string())
            .unwrap_or_else(|| {
                debug!(?descriptor, %reference, "descriptor reference did not resolve");
                String::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(value: Value) -> Vec<SourceEntry> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_each_entry_lands_in_one_bucket() {
        let list = entries(json!([
            { "_id": "s1", "name": "Fire Bolt", "type": "spell" },
            { "_id": "f1", "name": "Lucky", "type": "feat" },
            { "_id": "r1", "name": "Elf", "type": "race" },
            { "_id": "c1", "name": "Wizard", "type": "class" },
            { "_id": "b1", "name": "Sage", "type": "background" },
            { "_id": "k1", "name": "Backpack", "type": "container" },
            { "_id": "i1", "name": "Dagger", "type": "weapon" },
            { "_id": "i2", "name": "Mystery" },
            { "name": "Lost Sack", "type": "container" }
        ]));
        let buckets = classify(&list);

        assert_eq!(buckets.spells.len(), 1);
        assert_eq!(buckets.feats.len(), 1);
        assert_eq!(buckets.descriptors.len(), 3);
        assert_eq!(buckets.containers.len(), 1);
        assert_eq!(buckets.items.len(), 1);
        assert_eq!(buckets.items[0].name(), "Dagger");
        assert_eq!(buckets.entries.len(), 9);

        let bucketed = buckets.spells.len()
            + buckets.feats.len()
            + buckets.descriptors.len()
            + buckets.containers.len()
            + buckets.items.len();
        assert_eq!(bucketed, 7); // untyped entry and id-less container dropped
    }

    #[test]
    fn test_descriptor_by_id() {
        let list = entries(json!([
            { "_id": "x", "name": "Ignored", "type": "weapon" },
            { "_id": "race-1", "name": "High Elf", "type": "subrace" }
        ]));
        let buckets = classify(&list);
        let name = buckets.descriptor_name(Some(&json!("race-1")), Descriptor::Race);
        assert_eq!(name, "High Elf");
    }

    #[test]
    fn test_descriptor_by_type_first_match_wins() {
        let list = entries(json!([
            { "_id": "a", "name": "Fighter", "type": "class" },
            { "_id": "b", "name": "Wizard", "type": "class" }
        ]));
        let buckets = classify(&list);
        // Reference does not match any id, but the first class entry does by type.
        let name = buckets.descriptor_name(Some(&json!("b")), Descriptor::Class);
        assert_eq!(name, "Fighter");
    }

    #[test]
    fn test_descriptor_unset_reference_is_empty() {
        let list = entries(json!([{ "_id": "a", "name": "Acolyte", "type": "background" }]));
        let buckets = classify(&list);
        assert_eq!(buckets.descriptor_name(None, Descriptor::Background), "");
        assert_eq!(
            buckets.descriptor_name(Some(&json!("")), Descriptor::Background),
            ""
        );
        assert_eq!(
            buckets.descriptor_name(Some(&Value::Null), Descriptor::Background),
            ""
        );
    }

    #[test]
    fn test_descriptor_non_string_reference_matches_by_type() {
        let list = entries(json!([{ "_id": "a", "name": "Dwarf", "type": "race" }]));
        let buckets = classify(&list);
        let name = buckets.descriptor_name(Some(&json!({ "id": "a" })), Descriptor::Race);
        assert_eq!(name, "Dwarf");
    }

    #[test]
    fn test_descriptor_miss_is_empty() {
        let list = entries(json!([{ "_id": "a", "name": "Rope", "type": "loot" }]));
        let buckets = classify(&list);
        assert_eq!(
            buckets.descriptor_name(Some(&json!("zzz")), Descriptor::Race),
            ""
        );
    }
}
