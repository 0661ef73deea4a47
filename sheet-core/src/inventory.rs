//! Inventory views: one character's items grouped by container, and the
//! same across a whole party.

use crate::character::{CharacterRecord, Item, CONTAINER_TYPE};
use crate::store::StoredCharacter;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Which items to keep by equipped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquippedFilter {
    #[default]
    All,
    Equipped,
    Unequipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFilter {
    /// Keep only items with this type tag.
    pub item_type: Option<String>,
    pub equipped: EquippedFilter,
}

impl ItemFilter {
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_equipped(mut self, equipped: EquippedFilter) -> Self {
        self.equipped = equipped;
        self
    }

    pub fn accepts(&self, item: &Item) -> bool {
        if item.item_type == CONTAINER_TYPE {
            return false;
        }
        if let Some(wanted) = &self.item_type {
            if &item.item_type != wanted {
                return false;
            }
        }
        match self.equipped {
            EquippedFilter::All => true,
            EquippedFilter::Equipped => item.equipped,
            EquippedFilter::Unequipped => !item.equipped,
        }
    }
}

/// Items sharing one container reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerGroup<'a> {
    /// `None` for items not inside any container.
    pub container_id: Option<&'a str>,
    /// Container name, "No Container", or "Unknown Container".
    pub label: &'a str,
    pub items: Vec<&'a Item>,
}

impl ContainerGroup<'_> {
    pub fn weight(&self) -> f64 {
        self.items.iter().map(|i| i.stack_weight()).sum()
    }
}

/// Filtered items of one character, grouped by container. Loose items come
/// first, then containers by label; items keep source order within a group.
pub fn character_inventory<'a>(
    record: &'a CharacterRecord,
    filter: &ItemFilter,
) -> Vec<ContainerGroup<'a>> {
    let mut groups: Vec<ContainerGroup<'a>> = Vec::new();

    for item in record.items.iter().filter(|i| filter.accepts(i)) {
        let key = item.container_id.as_deref();
        match groups.iter_mut().find(|g| g.container_id == key) {
            Some(group) => group.items.push(item),
            None => groups.push(ContainerGroup {
                container_id: key,
                label: record.container_label(key),
                items: vec![item],
            }),
        }
    }

    groups.sort_by(|a, b| match (a.container_id, b.container_id) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(_), Some(_)) => a.label.cmp(b.label),
    });
    groups
}

/// One character's share of the party inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterInventory<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub groups: Vec<ContainerGroup<'a>>,
}

impl CharacterInventory<'_> {
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyInventory<'a> {
    pub characters: Vec<CharacterInventory<'a>>,
    /// Every item type across the party, sorted, before filtering.
    pub item_types: Vec<&'a str>,
    pub total_items: usize,
    /// Sum of weight times quantity over filtered items.
    pub total_weight: f64,
}

pub fn party_inventory<'a>(
    characters: &'a [StoredCharacter],
    filter: &ItemFilter,
) -> PartyInventory<'a> {
    let item_types: BTreeSet<&'a str> = characters
        .iter()
        .flat_map(|c| c.data.items.iter())
        .map(|i| i.item_type.as_str())
        .filter(|t| *t != CONTAINER_TYPE)
        .collect();

    let characters: Vec<CharacterInventory<'a>> = characters
        .iter()
        .map(|c| CharacterInventory {
            id: &c.id,
            name: &c.name,
            groups: character_inventory(&c.data, filter),
        })
        .collect();

    let total_items = characters.iter().map(|c| c.item_count()).sum();
    let total_weight = characters
        .iter()
        .flat_map(|c| c.groups.iter())
        .map(|g| g.weight())
        .sum();

    PartyInventory {
        characters,
        item_types: item_types.into_iter().collect(),
        total_items,
        total_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{NO_CONTAINER_LABEL, UNKNOWN_CONTAINER_LABEL};
    use crate::normalize::import_value;
    use crate::testing::{sample_party, EntryBuilder, SourceBuilder};

    fn stored_party() -> Vec<StoredCharacter> {
        sample_party()
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let data = import_value(raw).unwrap();
                StoredCharacter {
                    id: format!("char-{i}"),
                    name: data.name.clone(),
                    data,
                    uploaded_at: "2026-01-01T00:00:00Z".to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_character_groups_by_container() {
        let party = stored_party();
        let thorin = &party[0].data;
        let groups = character_inventory(thorin, &ItemFilter::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].container_id, None);
        assert_eq!(groups[0].label, NO_CONTAINER_LABEL);
        assert_eq!(groups[0].items[0].name, "Warhammer");
        assert_eq!(groups[1].container_id, Some("pack"));
        assert_eq!(groups[1].label, "Backpack");
        assert_eq!(groups[1].weight(), 10.0);
    }

    #[test]
    fn test_loose_items_first_then_containers_by_label() {
        let raw = SourceBuilder::new("Hoarder")
            .entry(EntryBuilder::new("sack", "Sack", "container"))
            .entry(EntryBuilder::new("chest", "Chest", "container"))
            .entry(EntryBuilder::item("Gem", "loot").container("sack"))
            .entry(EntryBuilder::item("Coin", "loot").container("chest"))
            .entry(EntryBuilder::item("Torch", "consumable"))
            .entry(EntryBuilder::item("Scroll", "loot").container("gone"))
            .entry(EntryBuilder::item("Pearl", "loot").container("sack"))
            .build();
        let record = import_value(raw).unwrap();
        let groups = character_inventory(&record, &ItemFilter::default());

        let labels: Vec<_> = groups.iter().map(|g| g.label).collect();
        assert_eq!(
            labels,
            vec![NO_CONTAINER_LABEL, "Chest", "Sack", UNKNOWN_CONTAINER_LABEL]
        );
        let sack: Vec<_> = groups[2].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(sack, vec!["Gem", "Pearl"]);
    }

    #[test]
    fn test_dangling_container_is_unknown() {
        let party = stored_party();
        let groups = character_inventory(&party[2].data, &ItemFilter::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].container_id, Some("missing"));
        assert_eq!(groups[0].label, UNKNOWN_CONTAINER_LABEL);
    }

    #[test]
    fn test_party_totals() {
        let party = stored_party();
        let inventory = party_inventory(&party, &ItemFilter::default());

        assert_eq!(inventory.characters.len(), 3);
        assert_eq!(inventory.total_items, 5);
        // 2 + 5*2 + 4 + 3 + 1
        assert_eq!(inventory.total_weight, 20.0);
        assert_eq!(
            inventory.item_types,
            vec!["consumable", "loot", "tool", "weapon"]
        );
    }

    #[test]
    fn test_party_filters() {
        let party = stored_party();

        let equipped = ItemFilter::default().with_equipped(EquippedFilter::Equipped);
        let inventory = party_inventory(&party, &equipped);
        assert_eq!(inventory.total_items, 2);
        assert_eq!(inventory.total_weight, 6.0);
        // Types are listed from the unfiltered inventory.
        assert_eq!(inventory.item_types.len(), 4);

        let weapons = ItemFilter::default().with_type("weapon");
        let inventory = party_inventory(&party, &weapons);
        assert_eq!(inventory.total_items, 2);
        assert_eq!(inventory.characters[2].item_count(), 0);
        assert!(inventory.characters[2].groups.is_empty());

        let unequipped = ItemFilter::default().with_equipped(EquippedFilter::Unequipped);
        assert_eq!(party_inventory(&party, &unequipped).total_items, 3);
    }
}
