//! Graphio Core -- rule-data extraction for factory-game wikis.
//!
//! This crate turns a game's static prototype database (entities, items,
//! fluids, recipes, technologies) into a pruned, export-ready snapshot. The
//! interesting part is the pruning: deciding which prototypes a player can
//! actually reach from a fresh game depends on a mutually recursive web of
//! mineable resources, craftable recipes, fluid temperatures, and research
//! prerequisites.
//!
//! # Pipeline
//!
//! 1. A [`registry::PrototypeRegistry`] provides read-only access to the
//!    prototype database ([`registry::GameRegistry`] is the in-memory
//!    implementation, usually built by the `graphio-data` loader).
//! 2. [`filter::PrototypeSets::partition`] splits the registry into the
//!    exportable categories (crafting machines, beacons, items, fluids,
//!    recipes) using structural predicates.
//! 3. [`solver::solve`] computes the least fixpoint of "attainable" over
//!    items, fluid temperatures, recipes, and technologies.
//! 4. [`view::PrunedView::build`] discards unreachable prototypes and
//!    derives the crafting-machine indices the export format needs.
//!
//! The solver runs to completion before any downstream serialization; its
//! result is immutable once returned.
//!
//! # Key Types
//!
//! - [`solver::AttainabilitySet`] -- monotone working state of the fixpoint.
//! - [`solver::PruneLevel`] -- how aggressively to prune (0/1/2).
//! - [`prototype::Temperature`] -- fluid temperature as Q32.32 fixed-point,
//!   so discrete temperatures can live in ordered sets.

pub mod filter;
pub mod prototype;
pub mod registry;
pub mod solver;
pub mod view;
