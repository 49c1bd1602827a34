//! Read-only access to the prototype database.
//!
//! [`PrototypeRegistry`] is the seam between the extraction pipeline and
//! whatever actually holds the game data: the in-memory [`GameRegistry`]
//! built by the data loader, or any other source that can answer the same
//! queries. All accessors return name-keyed `BTreeMap`s so iteration order
//! (and therefore export order) is deterministic.

use crate::prototype::{
    EntityPrototype, FluidPrototype, ItemPrototype, RecipePrototype, TechnologyPrototype,
};
use std::collections::BTreeMap;

/// Accessor contract required by the filter and the solver.
///
/// The registry is read-only with a single sanctioned mutation:
/// [`research_all`](PrototypeRegistry::research_all), used once before
/// solving at prune level 1 to model "every technology eventually gets
/// researched".
pub trait PrototypeRegistry {
    fn entities(&self) -> &BTreeMap<String, EntityPrototype>;
    fn items(&self) -> &BTreeMap<String, ItemPrototype>;
    fn fluids(&self) -> &BTreeMap<String, FluidPrototype>;
    fn recipes(&self) -> &BTreeMap<String, RecipePrototype>;
    fn technologies(&self) -> &BTreeMap<String, TechnologyPrototype>;

    /// Mark every technology researched and enable the recipes they unlock.
    fn research_all(&mut self);

    /// The recipes currently unlocked for crafting.
    fn enabled_recipes(&self) -> impl Iterator<Item = &RecipePrototype> {
        self.recipes().values().filter(|recipe| recipe.enabled)
    }

    /// The technologies currently available for research.
    fn enabled_technologies(&self) -> impl Iterator<Item = &TechnologyPrototype> {
        self.technologies().values().filter(|tech| tech.enabled)
    }
}

/// Errors from building a [`GameRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} prototype: '{name}'")]
    DuplicateName { kind: &'static str, name: String },
}

/// In-memory prototype database. Populated once, then frozen apart from the
/// `research_all` hook.
#[derive(Debug, Clone, Default)]
pub struct GameRegistry {
    entities: BTreeMap<String, EntityPrototype>,
    items: BTreeMap<String, ItemPrototype>,
    fluids: BTreeMap<String, FluidPrototype>,
    recipes: BTreeMap<String, RecipePrototype>,
    technologies: BTreeMap<String, TechnologyPrototype>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entity(&mut self, entity: EntityPrototype) -> Result<(), RegistryError> {
        if self.entities.contains_key(&entity.name) {
            return Err(RegistryError::DuplicateName {
                kind: "entity",
                name: entity.name,
            });
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn insert_item(&mut self, item: ItemPrototype) -> Result<(), RegistryError> {
        if self.items.contains_key(&item.name) {
            return Err(RegistryError::DuplicateName {
                kind: "item",
                name: item.name,
            });
        }
        self.items.insert(item.name.clone(), item);
        Ok(())
    }

    pub fn insert_fluid(&mut self, fluid: FluidPrototype) -> Result<(), RegistryError> {
        if self.fluids.contains_key(&fluid.name) {
            return Err(RegistryError::DuplicateName {
                kind: "fluid",
                name: fluid.name,
            });
        }
        self.fluids.insert(fluid.name.clone(), fluid);
        Ok(())
    }

    pub fn insert_recipe(&mut self, recipe: RecipePrototype) -> Result<(), RegistryError> {
        if self.recipes.contains_key(&recipe.name) {
            return Err(RegistryError::DuplicateName {
                kind: "recipe",
                name: recipe.name,
            });
        }
        self.recipes.insert(recipe.name.clone(), recipe);
        Ok(())
    }

    pub fn insert_technology(&mut self, tech: TechnologyPrototype) -> Result<(), RegistryError> {
        if self.technologies.contains_key(&tech.name) {
            return Err(RegistryError::DuplicateName {
                kind: "technology",
                name: tech.name,
            });
        }
        self.technologies.insert(tech.name.clone(), tech);
        Ok(())
    }
}

impl PrototypeRegistry for GameRegistry {
    fn entities(&self) -> &BTreeMap<String, EntityPrototype> {
        &self.entities
    }

    fn items(&self) -> &BTreeMap<String, ItemPrototype> {
        &self.items
    }

    fn fluids(&self) -> &BTreeMap<String, FluidPrototype> {
        &self.fluids
    }

    fn recipes(&self) -> &BTreeMap<String, RecipePrototype> {
        &self.recipes
    }

    fn technologies(&self) -> &BTreeMap<String, TechnologyPrototype> {
        &self.technologies
    }

    fn research_all(&mut self) {
        let mut unlocked: Vec<String> = Vec::new();
        for tech in self.technologies.values_mut() {
            tech.researched = true;
            unlocked.extend(tech.unlocks.iter().cloned());
        }
        for recipe_name in unlocked {
            if let Some(recipe) = self.recipes.get_mut(&recipe_name) {
                recipe.enabled = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::{Ingredient, IngredientResource, LocalisedString, Product};

    fn recipe(name: &str, enabled: bool) -> RecipePrototype {
        RecipePrototype {
            name: name.to_string(),
            localised_name: LocalisedString::key_only(format!("recipe-name.{name}")),
            localised_description: LocalisedString::key_only(format!("recipe-description.{name}")),
            energy_cost: 0.5,
            ingredients: vec![Ingredient {
                resource: IngredientResource::Item {
                    name: "iron-ore".to_string(),
                },
                amount: 1.0,
                catalyst_amount: 0.0,
            }],
            products: vec![Product::item("iron-plate", 1.0)],
            enabled,
            category: "smelting".to_string(),
        }
    }

    fn technology(name: &str, unlocks: &[&str]) -> TechnologyPrototype {
        TechnologyPrototype {
            name: name.to_string(),
            enabled: true,
            researched: false,
            prerequisites: vec![],
            research_ingredients: vec![],
            unlocks: unlocks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = GameRegistry::new();
        registry.insert_recipe(recipe("smelt", true)).unwrap();
        let result = registry.insert_recipe(recipe("smelt", false));
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateName { kind: "recipe", .. })
        ));
    }

    #[test]
    fn enabled_recipes_filters_on_flag() {
        let mut registry = GameRegistry::new();
        registry.insert_recipe(recipe("base", true)).unwrap();
        registry.insert_recipe(recipe("locked", false)).unwrap();

        let enabled: Vec<&str> = registry
            .enabled_recipes()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["base"]);
    }

    #[test]
    fn research_all_enables_unlocked_recipes() {
        let mut registry = GameRegistry::new();
        registry.insert_recipe(recipe("locked", false)).unwrap();
        registry
            .insert_technology(technology("metallurgy", &["locked"]))
            .unwrap();

        registry.research_all();

        assert!(registry.technologies()["metallurgy"].researched);
        assert!(registry.recipes()["locked"].enabled);
    }

    #[test]
    fn research_all_ignores_dangling_unlocks() {
        // The loader validates unlock references; a registry assembled by
        // hand may still carry dangling names, which must not panic here.
        let mut registry = GameRegistry::new();
        registry
            .insert_technology(technology("metallurgy", &["missing-recipe"]))
            .unwrap();
        registry.research_all();
        assert!(registry.technologies()["metallurgy"].researched);
    }

    #[test]
    fn iteration_is_name_ordered() {
        let mut registry = GameRegistry::new();
        registry.insert_recipe(recipe("zinc", true)).unwrap();
        registry.insert_recipe(recipe("alloy", true)).unwrap();
        registry.insert_recipe(recipe("mid", true)).unwrap();

        let names: Vec<&str> = registry.recipes().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alloy", "mid", "zinc"]);
    }
}
