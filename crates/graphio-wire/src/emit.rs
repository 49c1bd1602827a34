//! The export document schema: how a pruned snapshot becomes frames.
//!
//! Field order is load-bearing; the consumer reads positionally with no
//! self-description in the stream. Categories are emitted in a fixed
//! order (machines, beacons, recipes, items, fluids) after a header frame
//! carrying the five counts, and within each category entries follow the
//! view's name ordering.

use crate::frame::{FramedWriter, WireError};
use graphio_core::prototype::{
    EntityPrototype, Ingredient, IngredientResource, Product, ProductAmount, ProductResource,
    RecipePrototype, Temperature,
};
use graphio_core::view::PrunedView;
use std::io::Write;

/// In-game energy values are per tick; the export carries per-second
/// values.
const TICKS_PER_SECOND: f64 = 60.0;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The view's structural guarantees were violated; only reachable when
    /// a `PrunedView` is assembled by hand rather than built.
    #[error("entity '{entity}' is missing its {attribute}")]
    MalformedEntity {
        entity: String,
        attribute: &'static str,
    },
    /// A surviving recipe references a fluid outside the view, so its
    /// default output temperature cannot be resolved.
    #[error("recipe '{recipe}' references unknown fluid '{fluid}'")]
    UnknownFluid { recipe: String, fluid: String },
}

/// Serialize the whole snapshot as one framed document.
///
/// Either the full document including the terminal marker is written, or
/// the first fatal condition is returned with the stream left mid-way and
/// unterminated.
pub fn emit_document<W: Write>(
    view: &PrunedView,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    writer.begin_document()?;
    writer.write_counts(&[
        view.crafting_machines.len(),
        view.beacons.len(),
        view.recipes.len(),
        view.items.len(),
        view.fluids.len(),
    ])?;

    for machine in view.crafting_machines.values() {
        emit_machine(machine, writer)?;
    }
    for beacon in view.beacons.values() {
        emit_beacon(beacon, writer)?;
    }
    for recipe in view.recipes.values() {
        emit_recipe(recipe, view, writer)?;
    }
    for item in view.items.values() {
        tracing::debug!(kind = "item", name = item.name.as_str(), "emit");
        writer.write_str(&item.name)?;
        writer.write_localised(&item.localised_name)?;
        writer.write_localised(&item.localised_description)?;
        writer.write_flag(item.module_effects.is_some())?;
        if let Some(effects) = &item.module_effects {
            writer.write_number(effects.consumption)?;
            writer.write_number(effects.speed)?;
            writer.write_number(effects.productivity)?;
            writer.write_number(effects.pollution)?;
            writer.write_flag(item.limitations.is_some())?;
            if let Some(limitations) = &item.limitations {
                writer.write_count(limitations.len())?;
                for recipe in limitations {
                    writer.write_str(recipe)?;
                }
            }
        }
    }
    for fluid in view.fluids.values() {
        tracing::debug!(kind = "fluid", name = fluid.name.as_str(), "emit");
        writer.write_str(&fluid.name)?;
        writer.write_localised(&fluid.localised_name)?;
        writer.write_localised(&fluid.localised_description)?;
    }

    writer.end_document()?;
    Ok(())
}

fn emit_machine<W: Write>(
    machine: &EntityPrototype,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    tracing::debug!(kind = "machine", name = machine.name.as_str(), "emit");
    let crafting_speed = machine
        .crafting_speed
        .ok_or_else(|| EmitError::MalformedEntity {
            entity: machine.name.clone(),
            attribute: "crafting speed",
        })?;
    let drain = machine
        .energy_drain()
        .ok_or_else(|| EmitError::MalformedEntity {
            entity: machine.name.clone(),
            attribute: "energy source",
        })?;

    writer.write_str(&machine.name)?;
    writer.write_localised(&machine.localised_name)?;
    writer.write_localised(&machine.localised_description)?;
    writer.write_number(crafting_speed)?;
    writer.write_number(machine.energy_usage * TICKS_PER_SECOND)?;
    writer.write_number(drain * TICKS_PER_SECOND)?;
    writer.write_count(machine.module_slots as usize)?;
    writer.write_str(&machine.allowed_effects.bits())?;
    Ok(())
}

fn emit_beacon<W: Write>(
    beacon: &EntityPrototype,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    tracing::debug!(kind = "beacon", name = beacon.name.as_str(), "emit");
    let effectivity = beacon
        .distribution_effectivity
        .ok_or_else(|| EmitError::MalformedEntity {
            entity: beacon.name.clone(),
            attribute: "distribution effectivity",
        })?;

    writer.write_str(&beacon.name)?;
    writer.write_localised(&beacon.localised_name)?;
    writer.write_localised(&beacon.localised_description)?;
    writer.write_number(effectivity)?;
    writer.write_str(&beacon.allowed_effects.bits())?;
    Ok(())
}

fn emit_recipe<W: Write>(
    recipe: &RecipePrototype,
    view: &PrunedView,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    tracing::debug!(kind = "recipe", name = recipe.name.as_str(), "emit");
    writer.write_str(&recipe.name)?;
    writer.write_localised(&recipe.localised_name)?;
    writer.write_localised(&recipe.localised_description)?;
    writer.write_number(recipe.energy_cost)?;

    writer.write_count(recipe.ingredients.len())?;
    for ingredient in &recipe.ingredients {
        emit_ingredient(ingredient, writer)?;
    }

    writer.write_count(recipe.products.len())?;
    for product in &recipe.products {
        emit_product(product, recipe, view, writer)?;
    }

    let machines = view.machines_for_recipe(recipe);
    writer.write_count(machines.len())?;
    for machine in machines {
        writer.write_str(machine)?;
    }
    Ok(())
}

fn emit_ingredient<W: Write>(
    ingredient: &Ingredient,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    match &ingredient.resource {
        IngredientResource::Item { name } => {
            writer.write_str("item")?;
            writer.write_str(name)?;
            writer.write_number(ingredient.amount)?;
            writer.write_number(ingredient.catalyst_amount)?;
        }
        IngredientResource::Fluid {
            name,
            minimum_temperature,
            maximum_temperature,
        } => {
            writer.write_str("fluid")?;
            writer.write_str(name)?;
            writer.write_number(ingredient.amount)?;
            writer.write_number(ingredient.catalyst_amount)?;

            // Two presence bits, then only the bounds that exist.
            let bit = |bound: &Option<Temperature>| if bound.is_some() { '1' } else { '0' };
            let flags: String = [bit(minimum_temperature), bit(maximum_temperature)]
                .iter()
                .collect();
            writer.write_str(&flags)?;
            if let Some(minimum) = minimum_temperature {
                writer.write_number(minimum.to_num::<f64>())?;
            }
            if let Some(maximum) = maximum_temperature {
                writer.write_number(maximum.to_num::<f64>())?;
            }
        }
    }
    Ok(())
}

fn emit_product<W: Write>(
    product: &Product,
    recipe: &RecipePrototype,
    view: &PrunedView,
    writer: &mut FramedWriter<W>,
) -> Result<(), EmitError> {
    match &product.resource {
        ProductResource::Item { name } => {
            writer.write_str("item")?;
            writer.write_str(name)?;
        }
        ProductResource::Fluid { name, temperature } => {
            writer.write_str("fluid")?;
            writer.write_str(name)?;
            // The wire always carries a concrete output temperature.
            let temperature = match temperature {
                Some(temperature) => *temperature,
                None => {
                    view.fluids
                        .get(name)
                        .ok_or_else(|| EmitError::UnknownFluid {
                            recipe: recipe.name.clone(),
                            fluid: name.clone(),
                        })?
                        .default_temperature
                }
            };
            writer.write_number(temperature.to_num::<f64>())?;
        }
    }

    match &product.amount {
        ProductAmount::Fixed {
            amount,
            catalyst_amount,
        } => {
            writer.write_str("fixed")?;
            writer.write_number(*amount)?;
            writer.write_number(*catalyst_amount)?;
        }
        ProductAmount::Probability {
            amount_min,
            amount_max,
            probability,
        } => {
            writer.write_str("probability")?;
            writer.write_number(*amount_min)?;
            writer.write_number(*amount_max)?;
            writer.write_number(*probability)?;
        }
    }
    Ok(())
}
