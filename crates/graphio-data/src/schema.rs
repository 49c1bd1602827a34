//! Serde structs for the on-disk prototype format.
//!
//! These define what prototype data files look like before resolution.
//! They are deserialized from RON, JSON, or TOML and then turned into core
//! prototypes by the loader. Temperatures and amounts are plain floats in
//! the files; the loader converts temperatures to fixed-point.

use serde::Deserialize;

// ===========================================================================
// Shared pieces
// ===========================================================================

/// A localisation entry. When a prototype omits it, the loader derives the
/// key from the prototype kind and name.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalisedData {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Whether a recipe component is an item or a fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    Item,
    Fluid,
}

/// A recipe input, in short tuple form or full form. Fluids with
/// temperature bounds need the full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    /// Short form: `("item_name", amount)`.
    Short(String, f64),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        kind: ResourceKind,
        amount: f64,
        #[serde(default)]
        catalyst_amount: f64,
        #[serde(default)]
        minimum_temperature: Option<f64>,
        #[serde(default)]
        maximum_temperature: Option<f64>,
    },
}

/// A recipe output, in short tuple form or full form. A `probability`
/// makes the yield probabilistic, with `amount_min`/`amount_max` bounds
/// defaulting to `amount`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductData {
    /// Short form: `("item_name", amount)`.
    Short(String, f64),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        kind: ResourceKind,
        #[serde(default = "default_amount")]
        amount: f64,
        #[serde(default)]
        catalyst_amount: f64,
        #[serde(default)]
        temperature: Option<f64>,
        #[serde(default)]
        probability: Option<f64>,
        #[serde(default)]
        amount_min: Option<f64>,
        #[serde(default)]
        amount_max: Option<f64>,
    },
}

fn default_amount() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

// ===========================================================================
// Entities
// ===========================================================================

/// How an entity is powered.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySourceData {
    Electric {
        #[serde(default)]
        drain: f64,
    },
    Burner,
}

/// A fluid an entity emits on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct FluidOutputData {
    pub fluid: String,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// An entity definition. Crafting machines set `crafting_speed`, beacons
/// set `distribution_effectivity`; everything else is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityData {
    pub name: String,
    #[serde(default)]
    pub localised_name: Option<LocalisedData>,
    #[serde(default)]
    pub localised_description: Option<LocalisedData>,
    #[serde(default)]
    pub crafting_speed: Option<f64>,
    #[serde(default)]
    pub distribution_effectivity: Option<f64>,
    /// Per tick.
    #[serde(default)]
    pub energy_usage: f64,
    #[serde(default)]
    pub energy_source: Option<EnergySourceData>,
    #[serde(default)]
    pub module_slots: u32,
    /// Allowed module effect names; omitted means all four.
    #[serde(default)]
    pub allowed_effects: Option<Vec<String>>,
    #[serde(default)]
    pub crafting_categories: Vec<String>,
    #[serde(default)]
    pub ingredient_count: Option<u32>,
    #[serde(default)]
    pub items_to_place_this: Vec<String>,
    #[serde(default)]
    pub autoplace: bool,
    #[serde(default)]
    pub minable: Vec<ProductData>,
    #[serde(default)]
    pub fluid_output: Option<FluidOutputData>,
}

// ===========================================================================
// Items and fluids
// ===========================================================================

/// Module bonus modifiers.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ModuleEffectsData {
    #[serde(default)]
    pub consumption: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub productivity: f64,
    #[serde(default)]
    pub pollution: f64,
}

/// An item definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub localised_name: Option<LocalisedData>,
    #[serde(default)]
    pub localised_description: Option<LocalisedData>,
    #[serde(default)]
    pub module_effects: Option<ModuleEffectsData>,
    /// Recipe names a module is restricted to; omitted means unrestricted.
    #[serde(default)]
    pub limitations: Option<Vec<String>>,
}

/// A fluid definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FluidData {
    pub name: String,
    #[serde(default)]
    pub localised_name: Option<LocalisedData>,
    #[serde(default)]
    pub localised_description: Option<LocalisedData>,
    #[serde(default = "default_fluid_temperature")]
    pub default_temperature: f64,
    #[serde(default)]
    pub gas_temperature: Option<f64>,
}

fn default_fluid_temperature() -> f64 {
    15.0
}

// ===========================================================================
// Recipes and technologies
// ===========================================================================

/// A recipe definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub localised_name: Option<LocalisedData>,
    #[serde(default)]
    pub localised_description: Option<LocalisedData>,
    /// Base crafting time in seconds.
    #[serde(default = "default_energy_cost")]
    pub energy_cost: f64,
    #[serde(default)]
    pub ingredients: Vec<IngredientData>,
    #[serde(default)]
    pub products: Vec<ProductData>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_energy_cost() -> f64 {
    0.5
}

fn default_category() -> String {
    "crafting".to_string()
}

/// A technology definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnologyData {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub researched: bool,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Science packs consumed per research unit.
    #[serde(default)]
    pub ingredients: Vec<IngredientData>,
    /// Recipes enabled when researched.
    #[serde(default)]
    pub unlocks: Vec<String>,
}
