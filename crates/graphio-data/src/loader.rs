//! File discovery, deserialization, and registry construction.
//!
//! The loader reads up to five data files from a directory (`entities`,
//! `items`, `fluids`, `recipes`, `technologies`, each in RON, JSON, or
//! TOML), validates every cross-reference, and builds a
//! [`GameRegistry`]. Corrupt input is fatal here, before any solving:
//! retrying without fixing the files would fail identically.

use crate::schema::{
    EnergySourceData, EntityData, FluidData, IngredientData, ItemData, LocalisedData,
    ProductData, RecipeData, ResourceKind, TechnologyData,
};
use graphio_core::prototype::{
    AllowedEffects, EnergySource, EntityPrototype, FluidOutput, FluidPrototype, Ingredient,
    IngredientResource, ItemPrototype, LocalisedString, ModuleEffects, Product, ProductAmount,
    ProductResource, RecipePrototype, Temperature, TechnologyPrototype,
};
use graphio_core::registry::{GameRegistry, RegistryError};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading prototype data.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate prototype name was found.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<RegistryError> for DataLoadError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateName { kind, name } => Self::DuplicateName { kind, name },
        }
    }
}

// ===========================================================================
// Format detection and file discovery
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Scan a directory for a data file with the given base name (without
/// extension). Returns `Ok(None)` if no file exists, or
/// `Err(ConflictingFormats)` if more than one format does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    Ok(found)
}

/// Deserialize a list from a file. For TOML files, extracts the array at
/// the given `toml_key` from a top-level table. For RON and JSON, the file
/// body is the list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => {
            let table: toml::Value =
                toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(e.to_string()))
        }
    }
}

fn load_list<T: DeserializeOwned>(
    dir: &Path,
    base_name: &str,
) -> Result<(Vec<T>, PathBuf), DataLoadError> {
    match find_data_file(dir, base_name)? {
        Some(path) => {
            let list = deserialize_list(&path, base_name)?;
            Ok((list, path))
        }
        None => Ok((Vec::new(), dir.join(base_name))),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load and validate all prototype data files under `dir`.
///
/// Missing files are treated as empty categories; dangling name references
/// and duplicate names are fatal.
pub fn load_registry(dir: &Path) -> Result<GameRegistry, DataLoadError> {
    let (items, items_file) = load_list::<ItemData>(dir, "items")?;
    let (fluids, fluids_file) = load_list::<FluidData>(dir, "fluids")?;
    let (entities, entities_file) = load_list::<EntityData>(dir, "entities")?;
    let (recipes, recipes_file) = load_list::<RecipeData>(dir, "recipes")?;
    let (technologies, technologies_file) = load_list::<TechnologyData>(dir, "technologies")?;

    tracing::debug!(
        items = items.len(),
        fluids = fluids.len(),
        entities = entities.len(),
        recipes = recipes.len(),
        technologies = technologies.len(),
        dir = %dir.display(),
        "loaded prototype data",
    );

    let names = Names {
        items: items.iter().map(|i| i.name.clone()).collect(),
        fluids: fluids.iter().map(|f| f.name.clone()).collect(),
        recipes: recipes.iter().map(|r| r.name.clone()).collect(),
        technologies: technologies.iter().map(|t| t.name.clone()).collect(),
    };

    let mut registry = GameRegistry::new();
    for item in items {
        registry.insert_item(resolve_item(item, &names, &items_file)?)?;
    }
    for fluid in fluids {
        registry.insert_fluid(resolve_fluid(fluid))?;
    }
    for entity in entities {
        registry.insert_entity(resolve_entity(entity, &names, &entities_file)?)?;
    }
    for recipe in recipes {
        registry.insert_recipe(resolve_recipe(recipe, &names, &recipes_file)?)?;
    }
    for tech in technologies {
        registry.insert_technology(resolve_technology(tech, &names, &technologies_file)?)?;
    }
    Ok(registry)
}

/// All declared names, for reference validation.
struct Names {
    items: BTreeSet<String>,
    fluids: BTreeSet<String>,
    recipes: BTreeSet<String>,
    technologies: BTreeSet<String>,
}

fn check_ref(
    set: &BTreeSet<String>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<(), DataLoadError> {
    if set.contains(name) {
        Ok(())
    } else {
        Err(DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        })
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

fn temperature(value: f64) -> Temperature {
    Temperature::from_num(value)
}

fn localised(kind: &str, name: &str, data: Option<LocalisedData>) -> LocalisedString {
    match data {
        Some(LocalisedData { key, value: Some(value) }) => LocalisedString::resolved(key, value),
        Some(LocalisedData { key, value: None }) => LocalisedString::key_only(key),
        None => LocalisedString::key_only(format!("{kind}.{name}")),
    }
}

fn resolve_ingredient(
    data: IngredientData,
    names: &Names,
    file: &Path,
) -> Result<Ingredient, DataLoadError> {
    match data {
        IngredientData::Short(name, amount) => {
            check_ref(&names.items, &name, file, "item")?;
            Ok(Ingredient {
                resource: IngredientResource::Item { name },
                amount,
                catalyst_amount: 0.0,
            })
        }
        IngredientData::Full {
            name,
            kind,
            amount,
            catalyst_amount,
            minimum_temperature,
            maximum_temperature,
        } => {
            let resource = match kind {
                ResourceKind::Item => {
                    check_ref(&names.items, &name, file, "item")?;
                    IngredientResource::Item { name }
                }
                ResourceKind::Fluid => {
                    check_ref(&names.fluids, &name, file, "fluid")?;
                    IngredientResource::Fluid {
                        name,
                        minimum_temperature: minimum_temperature.map(temperature),
                        maximum_temperature: maximum_temperature.map(temperature),
                    }
                }
            };
            Ok(Ingredient {
                resource,
                amount,
                catalyst_amount,
            })
        }
    }
}

fn resolve_product(
    data: ProductData,
    names: &Names,
    file: &Path,
) -> Result<Product, DataLoadError> {
    match data {
        ProductData::Short(name, amount) => {
            check_ref(&names.items, &name, file, "item")?;
            Ok(Product::item(name, amount))
        }
        ProductData::Full {
            name,
            kind,
            amount,
            catalyst_amount,
            temperature: output_temperature,
            probability,
            amount_min,
            amount_max,
        } => {
            let resource = match kind {
                ResourceKind::Item => {
                    check_ref(&names.items, &name, file, "item")?;
                    ProductResource::Item { name }
                }
                ResourceKind::Fluid => {
                    check_ref(&names.fluids, &name, file, "fluid")?;
                    ProductResource::Fluid {
                        name,
                        temperature: output_temperature.map(temperature),
                    }
                }
            };
            let amount = match probability {
                Some(probability) => ProductAmount::Probability {
                    amount_min: amount_min.unwrap_or(amount),
                    amount_max: amount_max.unwrap_or(amount),
                    probability,
                },
                None => ProductAmount::Fixed {
                    amount,
                    catalyst_amount,
                },
            };
            Ok(Product { resource, amount })
        }
    }
}

fn resolve_item(
    data: ItemData,
    names: &Names,
    file: &Path,
) -> Result<ItemPrototype, DataLoadError> {
    let limitations = match data.limitations {
        Some(recipes) => {
            for recipe in &recipes {
                check_ref(&names.recipes, recipe, file, "recipe")?;
            }
            Some(recipes.into_iter().collect())
        }
        None => None,
    };
    Ok(ItemPrototype {
        localised_name: localised("item-name", &data.name, data.localised_name),
        localised_description: localised(
            "item-description",
            &data.name,
            data.localised_description,
        ),
        name: data.name,
        module_effects: data.module_effects.map(|effects| ModuleEffects {
            consumption: effects.consumption,
            speed: effects.speed,
            productivity: effects.productivity,
            pollution: effects.pollution,
        }),
        limitations,
    })
}

fn resolve_fluid(data: FluidData) -> FluidPrototype {
    FluidPrototype {
        localised_name: localised("fluid-name", &data.name, data.localised_name),
        localised_description: localised(
            "fluid-description",
            &data.name,
            data.localised_description,
        ),
        name: data.name,
        default_temperature: temperature(data.default_temperature),
        gas_temperature: data.gas_temperature.map(temperature),
    }
}

fn resolve_allowed_effects(
    effects: Option<Vec<String>>,
    file: &Path,
) -> Result<AllowedEffects, DataLoadError> {
    let Some(effects) = effects else {
        return Ok(AllowedEffects::ALL);
    };
    let mut allowed = AllowedEffects {
        consumption: false,
        speed: false,
        productivity: false,
        pollution: false,
    };
    for effect in effects {
        match effect.as_str() {
            "consumption" => allowed.consumption = true,
            "speed" => allowed.speed = true,
            "productivity" => allowed.productivity = true,
            "pollution" => allowed.pollution = true,
            _ => {
                return Err(DataLoadError::UnresolvedRef {
                    file: file.to_path_buf(),
                    name: effect,
                    expected_kind: "module effect",
                });
            }
        }
    }
    Ok(allowed)
}

fn resolve_entity(
    data: EntityData,
    names: &Names,
    file: &Path,
) -> Result<EntityPrototype, DataLoadError> {
    for item in &data.items_to_place_this {
        check_ref(&names.items, item, file, "item")?;
    }
    if let Some(output) = &data.fluid_output {
        check_ref(&names.fluids, &output.fluid, file, "fluid")?;
    }
    let mineable_products = data
        .minable
        .into_iter()
        .map(|product| resolve_product(product, names, file))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EntityPrototype {
        localised_name: localised("entity-name", &data.name, data.localised_name),
        localised_description: localised(
            "entity-description",
            &data.name,
            data.localised_description,
        ),
        name: data.name,
        crafting_speed: data.crafting_speed,
        distribution_effectivity: data.distribution_effectivity,
        energy_usage: data.energy_usage,
        energy_source: data.energy_source.map(|source| match source {
            EnergySourceData::Electric { drain } => EnergySource::Electric { drain },
            EnergySourceData::Burner => EnergySource::Burner,
        }),
        module_slots: data.module_slots,
        allowed_effects: resolve_allowed_effects(data.allowed_effects, file)?,
        crafting_categories: data.crafting_categories.into_iter().collect(),
        ingredient_count: data.ingredient_count,
        items_to_place_this: data.items_to_place_this,
        autoplace: data.autoplace,
        mineable_products,
        fluid_output: data.fluid_output.map(|output| FluidOutput {
            fluid: output.fluid,
            temperature: output.temperature.map(temperature),
        }),
    })
}

fn resolve_recipe(
    data: RecipeData,
    names: &Names,
    file: &Path,
) -> Result<RecipePrototype, DataLoadError> {
    let ingredients = data
        .ingredients
        .into_iter()
        .map(|ingredient| resolve_ingredient(ingredient, names, file))
        .collect::<Result<Vec<_>, _>>()?;
    let products = data
        .products
        .into_iter()
        .map(|product| resolve_product(product, names, file))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecipePrototype {
        localised_name: localised("recipe-name", &data.name, data.localised_name),
        localised_description: localised(
            "recipe-description",
            &data.name,
            data.localised_description,
        ),
        name: data.name,
        energy_cost: data.energy_cost,
        ingredients,
        products,
        enabled: data.enabled,
        category: data.category,
    })
}

fn resolve_technology(
    data: TechnologyData,
    names: &Names,
    file: &Path,
) -> Result<TechnologyPrototype, DataLoadError> {
    for prerequisite in &data.prerequisites {
        check_ref(&names.technologies, prerequisite, file, "technology")?;
    }
    for unlock in &data.unlocks {
        check_ref(&names.recipes, unlock, file, "recipe")?;
    }
    let research_ingredients = data
        .ingredients
        .into_iter()
        .map(|ingredient| resolve_ingredient(ingredient, names, file))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TechnologyPrototype {
        name: data.name,
        enabled: data.enabled,
        researched: data.researched,
        prerequisites: data.prerequisites,
        research_ingredients,
        unlocks: data.unlocks,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
