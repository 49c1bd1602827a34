//! Prototype data model: the attributes of entities, items, fluids, recipes,
//! and technologies that the solver and the export format care about.
//!
//! Prototypes are plain owned data. They are built once (by a loader or by
//! test setup code) and never mutated afterwards, with one exception: the
//! registry's `research_all` hook flips technology and recipe enablement
//! flags before solving at prune level 1.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fluid temperature in degrees, as Q32.32 fixed-point.
///
/// Temperatures act as set members in the attainability fixpoint, so they
/// need total ordering and hashing -- which rules out `f64`.
pub type Temperature = fixed::types::I32F32;

/// A translatable string: a localisation key plus, when the data source
/// already knows it, the resolved display text. Resolution is otherwise
/// deferred to the consumer of the export stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalisedString {
    pub key: String,
    pub value: Option<String>,
}

impl LocalisedString {
    /// A localised string whose display text is left for downstream lookup.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// A localised string with known display text.
    pub fn resolved(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe components
// ---------------------------------------------------------------------------

/// What a recipe ingredient consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngredientResource {
    Item {
        name: String,
    },
    /// A fluid ingredient may constrain the accepted temperature range.
    /// Bounds are inclusive; a missing bound is open.
    Fluid {
        name: String,
        minimum_temperature: Option<Temperature>,
        maximum_temperature: Option<Temperature>,
    },
}

/// One recipe input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub resource: IngredientResource,
    pub amount: f64,
    /// Portion of `amount` that is returned as a product of the same recipe.
    pub catalyst_amount: f64,
}

/// What a recipe product yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductResource {
    Item {
        name: String,
    },
    /// A fluid product comes out at a fixed temperature; `None` means the
    /// fluid's default temperature.
    Fluid {
        name: String,
        temperature: Option<Temperature>,
    },
}

/// How much of a product a recipe yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductAmount {
    Fixed {
        amount: f64,
        catalyst_amount: f64,
    },
    Probability {
        amount_min: f64,
        amount_max: f64,
        probability: f64,
    },
}

/// One recipe output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub resource: ProductResource,
    pub amount: ProductAmount,
}

impl Product {
    /// Convenience constructor for a plain item product.
    pub fn item(name: impl Into<String>, amount: f64) -> Self {
        Self {
            resource: ProductResource::Item { name: name.into() },
            amount: ProductAmount::Fixed {
                amount,
                catalyst_amount: 0.0,
            },
        }
    }

    /// Convenience constructor for a fluid product at an optional fixed
    /// temperature.
    pub fn fluid(name: impl Into<String>, amount: f64, temperature: Option<Temperature>) -> Self {
        Self {
            resource: ProductResource::Fluid {
                name: name.into(),
                temperature,
            },
            amount: ProductAmount::Fixed {
                amount,
                catalyst_amount: 0.0,
            },
        }
    }
}

/// A crafting recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipePrototype {
    pub name: String,
    pub localised_name: LocalisedString,
    pub localised_description: LocalisedString,
    /// Base crafting time in seconds (before machine speed).
    pub energy_cost: f64,
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Product>,
    /// Whether the recipe is unlocked without any research.
    pub enabled: bool,
    /// Crafting category label shared with machines.
    pub category: String,
}

// ---------------------------------------------------------------------------
// Technologies
// ---------------------------------------------------------------------------

/// A researchable technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyPrototype {
    pub name: String,
    pub enabled: bool,
    pub researched: bool,
    /// Names of technologies that must be researched first.
    pub prerequisites: Vec<String>,
    /// Ingredients consumed per research unit (science packs).
    pub research_ingredients: Vec<Ingredient>,
    /// Names of recipes this technology enables when researched.
    pub unlocks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Which module bonus types an entity accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedEffects {
    pub consumption: bool,
    pub speed: bool,
    pub productivity: bool,
    pub pollution: bool,
}

impl AllowedEffects {
    pub const ALL: AllowedEffects = AllowedEffects {
        consumption: true,
        speed: true,
        productivity: true,
        pollution: true,
    };

    /// Four-character `'1'`/`'0'` string in consumption, speed,
    /// productivity, pollution order -- the export format's encoding.
    pub fn bits(&self) -> String {
        let bit = |b: bool| if b { '1' } else { '0' };
        [
            bit(self.consumption),
            bit(self.speed),
            bit(self.productivity),
            bit(self.pollution),
        ]
        .iter()
        .collect()
    }
}

impl Default for AllowedEffects {
    fn default() -> Self {
        Self::ALL
    }
}

/// Per-effect bonuses of a module item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleEffects {
    pub consumption: f64,
    pub speed: f64,
    pub productivity: f64,
    pub pollution: f64,
}

/// How an entity is powered. Entities that are neither electric nor
/// burner-driven are rejected as corrupt input before export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnergySource {
    /// Electric, with a constant idle drain (per tick).
    Electric { drain: f64 },
    /// Fuel-burning; no idle drain.
    Burner,
}

/// A fluid an entity pushes into the world by itself (offshore pumps,
/// boilers). The solver treats these as fluid sources once the entity is
/// placeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidOutput {
    pub fluid: String,
    /// Output temperature; `None` means the fluid's default temperature.
    pub temperature: Option<Temperature>,
}

/// A placeable entity prototype. Only the attributes relevant to crafting
/// machines, beacons, and attainability seeding are modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPrototype {
    pub name: String,
    pub localised_name: LocalisedString,
    pub localised_description: LocalisedString,
    /// Present iff the entity is a crafting machine.
    pub crafting_speed: Option<f64>,
    /// Present iff the entity is a beacon.
    pub distribution_effectivity: Option<f64>,
    /// Energy consumed while working, per tick.
    pub energy_usage: f64,
    pub energy_source: Option<EnergySource>,
    pub module_slots: u32,
    pub allowed_effects: AllowedEffects,
    /// Crafting categories this machine can process.
    pub crafting_categories: BTreeSet<String>,
    /// Maximum ingredient count of processable recipes, if limited.
    pub ingredient_count: Option<u32>,
    /// Item names that place this entity.
    pub items_to_place_this: Vec<String>,
    /// Whether the entity spawns in the world on its own.
    pub autoplace: bool,
    /// Products yielded when the entity is mined.
    pub mineable_products: Vec<Product>,
    /// Fluid the entity produces without a recipe, if any.
    pub fluid_output: Option<FluidOutput>,
}

impl EntityPrototype {
    pub fn is_crafting_machine(&self) -> bool {
        self.crafting_speed.is_some()
    }

    pub fn is_beacon(&self) -> bool {
        self.distribution_effectivity.is_some()
    }

    /// Idle energy drain per tick, or `None` when the energy source is
    /// missing (corrupt input).
    pub fn energy_drain(&self) -> Option<f64> {
        match self.energy_source {
            Some(EnergySource::Electric { drain }) => Some(drain),
            Some(EnergySource::Burner) => Some(0.0),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Items and fluids
// ---------------------------------------------------------------------------

/// An inventory item prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPrototype {
    pub name: String,
    pub localised_name: LocalisedString,
    pub localised_description: LocalisedString,
    /// Present iff the item is a module.
    pub module_effects: Option<ModuleEffects>,
    /// Recipe names the module is restricted to; `None` means unrestricted.
    pub limitations: Option<BTreeSet<String>>,
}

/// A fluid prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidPrototype {
    pub name: String,
    pub localised_name: LocalisedString,
    pub localised_description: LocalisedString,
    pub default_temperature: Temperature,
    /// Temperature at which the fluid becomes a gas. `None` (or a value at
    /// the representable maximum) means the fluid has no practical gas
    /// phase; anything lower marks boiler-style byproducts the solver seeds
    /// unconditionally.
    pub gas_temperature: Option<Temperature>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_effects_bits_order() {
        let effects = AllowedEffects {
            consumption: true,
            speed: false,
            productivity: true,
            pollution: false,
        };
        assert_eq!(effects.bits(), "1010");
        assert_eq!(AllowedEffects::ALL.bits(), "1111");
    }

    #[test]
    fn localised_string_constructors() {
        let bare = LocalisedString::key_only("item-name.iron-ore");
        assert_eq!(bare.key, "item-name.iron-ore");
        assert!(bare.value.is_none());

        let known = LocalisedString::resolved("item-name.iron-ore", "Iron ore");
        assert_eq!(known.value.as_deref(), Some("Iron ore"));
    }

    #[test]
    fn energy_drain_by_source() {
        let mut entity = EntityPrototype {
            name: "assembler".to_string(),
            localised_name: LocalisedString::key_only("entity-name.assembler"),
            localised_description: LocalisedString::key_only("entity-description.assembler"),
            crafting_speed: Some(0.5),
            distribution_effectivity: None,
            energy_usage: 1250.0,
            energy_source: Some(EnergySource::Electric { drain: 41.0 }),
            module_slots: 0,
            allowed_effects: AllowedEffects::ALL,
            crafting_categories: BTreeSet::new(),
            ingredient_count: Some(2),
            items_to_place_this: vec!["assembler".to_string()],
            autoplace: false,
            mineable_products: vec![],
            fluid_output: None,
        };
        assert_eq!(entity.energy_drain(), Some(41.0));

        entity.energy_source = Some(EnergySource::Burner);
        assert_eq!(entity.energy_drain(), Some(0.0));

        entity.energy_source = None;
        assert_eq!(entity.energy_drain(), None);
    }

    #[test]
    fn temperature_serializes_through_serde() {
        let fluid = FluidPrototype {
            name: "steam".to_string(),
            localised_name: LocalisedString::key_only("fluid-name.steam"),
            localised_description: LocalisedString::key_only("fluid-description.steam"),
            default_temperature: Temperature::from_num(165),
            gas_temperature: Some(Temperature::from_num(100)),
        };
        let json = serde_json::to_string(&fluid).unwrap();
        let back: FluidPrototype = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fluid);
        assert_eq!(back.default_temperature, Temperature::from_num(165));
    }

    #[test]
    fn entity_kind_predicates() {
        let entity = EntityPrototype {
            name: "beacon".to_string(),
            localised_name: LocalisedString::key_only("entity-name.beacon"),
            localised_description: LocalisedString::key_only("entity-description.beacon"),
            crafting_speed: None,
            distribution_effectivity: Some(0.5),
            energy_usage: 0.0,
            energy_source: Some(EnergySource::Electric { drain: 0.0 }),
            module_slots: 2,
            allowed_effects: AllowedEffects::ALL,
            crafting_categories: BTreeSet::new(),
            ingredient_count: None,
            items_to_place_this: vec![],
            autoplace: false,
            mineable_products: vec![],
            fluid_output: None,
        };
        assert!(entity.is_beacon());
        assert!(!entity.is_crafting_machine());
    }
}
