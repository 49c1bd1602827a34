//! The export-ready snapshot left after pruning.
//!
//! [`PrunedView::build`] re-filters every partitioned category against the
//! solver's fixpoint and derives the crafting-machine indices the export
//! format wants: which machines serve each recipe category, and which of
//! those can actually hold a given recipe's ingredients. Built once, read
//! by the serializer, then discarded.

use crate::filter::{PrototypeSets, filter};
use crate::prototype::{EntityPrototype, RecipePrototype};
use crate::solver::AttainabilitySet;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("surviving entity '{0}' has no recognized energy source")]
    MissingEnergySource(String),
}

/// Immutable pruned snapshot plus derived machine indices.
#[derive(Debug, Clone)]
pub struct PrunedView {
    pub crafting_machines: BTreeMap<String, EntityPrototype>,
    pub beacons: BTreeMap<String, EntityPrototype>,
    pub items: BTreeMap<String, crate::prototype::ItemPrototype>,
    pub fluids: BTreeMap<String, crate::prototype::FluidPrototype>,
    pub recipes: BTreeMap<String, RecipePrototype>,
    /// Recipe category to the sorted, duplicate-free names of surviving
    /// machines that handle it.
    machines_by_category: BTreeMap<String, Vec<String>>,
}

impl PrunedView {
    /// Intersect `sets` with the fixpoint and derive the machine indices.
    ///
    /// A surviving machine or beacon without a recognized energy source is
    /// fatal: the serializer has no drain value to write for it.
    pub fn build(
        sets: &PrototypeSets,
        attainable: &AttainabilitySet,
    ) -> Result<Self, ViewError> {
        let crafting_machines = prune(&sets.crafting_machines, "machine", |machine| {
            attainable.entity_attainable(machine)
        });
        let beacons = prune(&sets.beacons, "beacon", |beacon| {
            attainable.entity_attainable(beacon)
        });
        for entity in crafting_machines.values().chain(beacons.values()) {
            if entity.energy_drain().is_none() {
                return Err(ViewError::MissingEnergySource(entity.name.clone()));
            }
        }

        let recipes = prune(&sets.recipes, "recipe", |recipe| {
            attainable.contains_recipe(&recipe.name)
        });
        let mut items = prune(&sets.items, "item", |item| {
            attainable.contains_item(&item.name)
        });
        let fluids = prune(&sets.fluids, "fluid", |fluid| {
            attainable.contains_fluid(&fluid.name)
        });

        // Module limitations may name recipes that just got pruned away;
        // the export must not reference anything outside the view.
        for item in items.values_mut() {
            if let Some(limitations) = &mut item.limitations {
                limitations.retain(|recipe| recipes.contains_key(recipe));
            }
        }

        let mut by_category: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for machine in crafting_machines.values() {
            for category in &machine.crafting_categories {
                by_category
                    .entry(category.clone())
                    .or_default()
                    .insert(machine.name.clone());
            }
        }
        let machines_by_category = by_category
            .into_iter()
            .map(|(category, names)| (category, names.into_iter().collect()))
            .collect();

        Ok(Self {
            crafting_machines,
            beacons,
            items,
            fluids,
            recipes,
            machines_by_category,
        })
    }

    /// Sorted machine names serving a recipe category. Empty when no
    /// surviving machine declares the category.
    pub fn machines_in_category(&self, category: &str) -> &[String] {
        self.machines_by_category
            .get(category)
            .map_or(&[], Vec::as_slice)
    }

    /// The machines that can actually run `recipe`: they serve its
    /// category and their ingredient-slot limit, if any, fits the
    /// recipe's ingredient count. Sorted by name.
    pub fn machines_for_recipe(&self, recipe: &RecipePrototype) -> Vec<&str> {
        let ingredient_count = recipe.ingredients.len() as u32;
        self.machines_in_category(&recipe.category)
            .iter()
            .filter(|name| {
                // Index keys come from the machine table itself.
                self.crafting_machines.get(name.as_str()).is_some_and(|machine| {
                    machine
                        .ingredient_count
                        .is_none_or(|limit| limit >= ingredient_count)
                })
            })
            .map(String::as_str)
            .collect()
    }
}

fn prune<V: Clone>(
    table: &BTreeMap<String, V>,
    kind: &'static str,
    keep: impl Fn(&V) -> bool,
) -> BTreeMap<String, V> {
    let kept = filter(table, &keep);
    for name in table.keys() {
        if !kept.contains_key(name) {
            tracing::debug!(kind, name = name.as_str(), "pruned");
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::{
        AllowedEffects, EnergySource, Ingredient, IngredientResource, ItemPrototype,
        LocalisedString, Product,
    };
    use crate::registry::GameRegistry;
    use crate::solver::{PruneLevel, solve};

    fn machine(name: &str, categories: &[&str], slots: Option<u32>) -> EntityPrototype {
        EntityPrototype {
            name: name.to_string(),
            localised_name: LocalisedString::key_only(format!("entity-name.{name}")),
            localised_description: LocalisedString::key_only(format!("entity-description.{name}")),
            crafting_speed: Some(1.0),
            distribution_effectivity: None,
            energy_usage: 2.0,
            energy_source: Some(EnergySource::Electric { drain: 0.1 }),
            module_slots: 2,
            allowed_effects: AllowedEffects::ALL,
            crafting_categories: categories.iter().map(|s| s.to_string()).collect(),
            ingredient_count: slots,
            items_to_place_this: vec![format!("{name}-item")],
            autoplace: false,
            mineable_products: vec![],
            fluid_output: None,
        }
    }

    fn item(name: &str) -> ItemPrototype {
        ItemPrototype {
            name: name.to_string(),
            localised_name: LocalisedString::key_only(format!("item-name.{name}")),
            localised_description: LocalisedString::key_only(format!("item-description.{name}")),
            module_effects: None,
            limitations: None,
        }
    }

    fn recipe(name: &str, category: &str, ingredients: usize) -> RecipePrototype {
        RecipePrototype {
            name: name.to_string(),
            localised_name: LocalisedString::key_only(format!("recipe-name.{name}")),
            localised_description: LocalisedString::key_only(format!("recipe-description.{name}")),
            energy_cost: 1.0,
            ingredients: (0..ingredients)
                .map(|i| Ingredient {
                    resource: IngredientResource::Item {
                        name: format!("part-{i}"),
                    },
                    amount: 1.0,
                    catalyst_amount: 0.0,
                })
                .collect(),
            products: vec![Product::item(&format!("{name}-out"), 1.0)],
            enabled: true,
            category: category.to_string(),
        }
    }

    /// Unrestricted fixpoint over an assembled registry.
    fn setup_view(registry: &mut GameRegistry) -> PrunedView {
        let sets = PrototypeSets::partition(registry);
        let attainable = solve(registry, PruneLevel::None).unwrap();
        PrunedView::build(&sets, &attainable).unwrap()
    }

    #[test]
    fn category_index_is_sorted_and_deduplicated() {
        let mut registry = GameRegistry::new();
        registry
            .insert_entity(machine("zeta", &["smelting", "crafting"], None))
            .unwrap();
        registry
            .insert_entity(machine("alpha", &["smelting"], None))
            .unwrap();

        let view = setup_view(&mut registry);
        assert_eq!(view.machines_in_category("smelting"), ["alpha", "zeta"]);
        assert_eq!(view.machines_in_category("crafting"), ["zeta"]);
        assert!(view.machines_in_category("chemistry").is_empty());
    }

    #[test]
    fn ingredient_slot_limit_filters_machines() {
        let mut registry = GameRegistry::new();
        registry
            .insert_entity(machine("cramped", &["crafting"], Some(2)))
            .unwrap();
        registry
            .insert_entity(machine("roomy", &["crafting"], Some(4)))
            .unwrap();
        registry
            .insert_entity(machine("unlimited", &["crafting"], None))
            .unwrap();

        let view = setup_view(&mut registry);
        let wide = recipe("wide", "crafting", 3);
        assert_eq!(view.machines_for_recipe(&wide), ["roomy", "unlimited"]);

        let narrow = recipe("narrow", "crafting", 2);
        assert_eq!(
            view.machines_for_recipe(&narrow),
            ["cramped", "roomy", "unlimited"]
        );
    }

    #[test]
    fn unreachable_machines_are_pruned_from_index() {
        let mut registry = GameRegistry::new();
        registry.insert_item(item("reachable-item")).unwrap();
        let mut reachable = machine("reachable", &["crafting"], None);
        reachable.items_to_place_this = vec!["reachable-item".to_string()];
        let mut ghost = machine("ghost", &["crafting"], None);
        ghost.items_to_place_this = vec!["ghost-item".to_string()];
        registry.insert_entity(reachable).unwrap();
        registry.insert_entity(ghost).unwrap();

        // Only reachable-item is mineable.
        let mut patch = machine("patch", &[], None);
        patch.crafting_speed = None;
        patch.energy_source = Some(EnergySource::Burner);
        patch.autoplace = true;
        patch.mineable_products = vec![Product::item("reachable-item", 1.0)];
        patch.items_to_place_this = vec![];
        registry.insert_entity(patch).unwrap();

        let sets = PrototypeSets::partition(&registry);
        let attainable = solve(&mut registry, PruneLevel::Researched).unwrap();
        let view = PrunedView::build(&sets, &attainable).unwrap();

        assert!(view.crafting_machines.contains_key("reachable"));
        assert!(!view.crafting_machines.contains_key("ghost"));
        assert_eq!(view.machines_in_category("crafting"), ["reachable"]);
    }

    #[test]
    fn limitations_shrink_to_surviving_recipes() {
        let mut registry = GameRegistry::new();
        registry.insert_item(item("ore")).unwrap();
        registry.insert_item(item("bar")).unwrap();
        let mut module = item("prod-module");
        module.limitations = Some(
            ["smelt", "vanished"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        registry.insert_item(module).unwrap();

        let mut patch = machine("patch", &[], None);
        patch.crafting_speed = None;
        patch.autoplace = true;
        patch.mineable_products = vec![
            Product::item("ore", 1.0),
            Product::item("prod-module", 1.0),
        ];
        patch.items_to_place_this = vec![];
        registry.insert_entity(patch).unwrap();

        let mut smelt = recipe("smelt", "smelting", 0);
        smelt.ingredients = vec![Ingredient {
            resource: IngredientResource::Item {
                name: "ore".to_string(),
            },
            amount: 1.0,
            catalyst_amount: 0.0,
        }];
        smelt.products = vec![Product::item("bar", 1.0)];
        registry.insert_recipe(smelt).unwrap();

        let mut vanished = recipe("vanished", "smelting", 0);
        vanished.ingredients = vec![Ingredient {
            resource: IngredientResource::Item {
                name: "unobtainium".to_string(),
            },
            amount: 1.0,
            catalyst_amount: 0.0,
        }];
        vanished.enabled = true;
        registry.insert_recipe(vanished).unwrap();
        registry.insert_item(item("unobtainium")).unwrap();

        let sets = PrototypeSets::partition(&registry);
        let attainable = solve(&mut registry, PruneLevel::Reachable).unwrap();
        let view = PrunedView::build(&sets, &attainable).unwrap();

        assert!(view.recipes.contains_key("smelt"));
        assert!(!view.recipes.contains_key("vanished"));
        let limitations = view.items["prod-module"].limitations.as_ref().unwrap();
        assert_eq!(
            limitations.iter().collect::<Vec<_>>(),
            vec![&"smelt".to_string()]
        );
    }

    #[test]
    fn surviving_machine_without_energy_source_is_fatal() {
        let mut registry = GameRegistry::new();
        let mut broken = machine("broken", &["crafting"], None);
        broken.energy_source = None;
        registry.insert_entity(broken).unwrap();

        let sets = PrototypeSets::partition(&registry);
        let result = PrunedView::build(&sets, &AttainabilitySet::unrestricted());
        assert!(matches!(
            result,
            Err(ViewError::MissingEnergySource(name)) if name == "broken"
        ));
    }

    #[test]
    fn unrestricted_view_keeps_everything() {
        let mut registry = GameRegistry::new();
        registry.insert_item(item("never-craftable")).unwrap();
        registry
            .insert_recipe(recipe("orphan", "crafting", 1))
            .unwrap();

        let view = setup_view(&mut registry);
        assert!(view.items.contains_key("never-craftable"));
        assert!(view.recipes.contains_key("orphan"));
    }
}
