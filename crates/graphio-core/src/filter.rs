//! Structural partition of the registry into exportable categories.
//!
//! The predicates are purely structural: a crafting machine is any entity
//! with a crafting speed, a beacon any entity with a distribution
//! effectivity. Items, fluids, and recipes pass through whole. Nothing here
//! looks at attainability; that is the solver's job.

use crate::prototype::{
    EntityPrototype, FluidPrototype, ItemPrototype, RecipePrototype,
};
use crate::registry::PrototypeRegistry;
use std::collections::BTreeMap;

/// Key-preserving filter over a prototype table. Pure; empty input yields
/// empty output.
pub fn filter<V: Clone>(
    prototypes: &BTreeMap<String, V>,
    predicate: impl Fn(&V) -> bool,
) -> BTreeMap<String, V> {
    prototypes
        .iter()
        .filter(|(_, value)| predicate(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The registry partitioned into export categories. Built once at the start
/// of a run and never mutated.
#[derive(Debug, Clone)]
pub struct PrototypeSets {
    pub crafting_machines: BTreeMap<String, EntityPrototype>,
    pub beacons: BTreeMap<String, EntityPrototype>,
    pub items: BTreeMap<String, ItemPrototype>,
    pub fluids: BTreeMap<String, FluidPrototype>,
    pub recipes: BTreeMap<String, RecipePrototype>,
}

impl PrototypeSets {
    pub fn partition<R: PrototypeRegistry>(registry: &R) -> Self {
        Self {
            crafting_machines: filter(registry.entities(), EntityPrototype::is_crafting_machine),
            beacons: filter(registry.entities(), EntityPrototype::is_beacon),
            items: registry.items().clone(),
            fluids: registry.fluids().clone(),
            recipes: registry.recipes().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::{AllowedEffects, EnergySource, LocalisedString};
    use crate::registry::GameRegistry;
    use std::collections::BTreeSet;

    fn entity(name: &str, crafting_speed: Option<f64>, effectivity: Option<f64>) -> EntityPrototype {
        EntityPrototype {
            name: name.to_string(),
            localised_name: LocalisedString::key_only(format!("entity-name.{name}")),
            localised_description: LocalisedString::key_only(format!("entity-description.{name}")),
            crafting_speed,
            distribution_effectivity: effectivity,
            energy_usage: 0.0,
            energy_source: Some(EnergySource::Burner),
            module_slots: 0,
            allowed_effects: AllowedEffects::ALL,
            crafting_categories: BTreeSet::new(),
            ingredient_count: None,
            items_to_place_this: vec![],
            autoplace: false,
            mineable_products: vec![],
            fluid_output: None,
        }
    }

    #[test]
    fn partition_by_structural_predicates() {
        let mut registry = GameRegistry::new();
        registry
            .insert_entity(entity("furnace", Some(1.0), None))
            .unwrap();
        registry
            .insert_entity(entity("beacon", None, Some(0.5)))
            .unwrap();
        registry
            .insert_entity(entity("pipe", None, None))
            .unwrap();

        let sets = PrototypeSets::partition(&registry);
        assert!(sets.crafting_machines.contains_key("furnace"));
        assert!(!sets.crafting_machines.contains_key("beacon"));
        assert!(sets.beacons.contains_key("beacon"));
        assert!(!sets.beacons.contains_key("pipe"));
    }

    #[test]
    fn empty_registry_partitions_empty() {
        let registry = GameRegistry::new();
        let sets = PrototypeSets::partition(&registry);
        assert!(sets.crafting_machines.is_empty());
        assert!(sets.beacons.is_empty());
        assert!(sets.items.is_empty());
        assert!(sets.fluids.is_empty());
        assert!(sets.recipes.is_empty());
    }

    #[test]
    fn filter_preserves_keys() {
        let mut table = BTreeMap::new();
        table.insert("a".to_string(), 1u32);
        table.insert("b".to_string(), 2u32);
        table.insert("c".to_string(), 3u32);

        let odd = filter(&table, |v| v % 2 == 1);
        assert_eq!(odd.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(odd["a"], 1);
    }
}
