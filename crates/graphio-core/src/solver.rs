//! The attainability fixpoint solver.
//!
//! Attainability is mutually recursive: recipes need attainable ingredients,
//! products of craftable recipes become attainable, fluid temperatures come
//! from entities that are themselves placed by attainable items, and at the
//! strictest prune level technologies gate recipes behind research whose
//! science packs must be attainable too. The solver computes the least
//! fixpoint by seeding from world-given sources and relaxing until a full
//! pass adds nothing.
//!
//! Membership in the working [`AttainabilitySet`] only ever grows, which
//! bounds the relaxation loop by the (finite) registry size and makes any
//! intermediate state a sound under-approximation.

use crate::prototype::{
    EntityPrototype, Ingredient, IngredientResource, Product, ProductResource, Temperature,
};
use crate::registry::PrototypeRegistry;
use std::collections::{BTreeMap, BTreeSet};

/// How aggressively unreachable prototypes are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneLevel {
    /// No pruning: every declared prototype is kept.
    None,
    /// Assume every technology eventually gets researched; prune only what
    /// is never craftable or placeable even then.
    Researched,
    /// Technologies must themselves be reached through the research chain.
    Reachable,
}

impl PruneLevel {
    /// Map the external `0 | 1 | 2` configuration value.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Researched),
            2 => Some(Self::Reachable),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Researched => 1,
            Self::Reachable => 2,
        }
    }
}

/// Fatal conditions detected while solving. The registry is assumed
/// internally consistent, so these indicate corrupt input and abort the
/// whole extraction.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("entity '{0}' has neither an electric nor a burner energy source")]
    MissingEnergySource(String),
}

/// The reachable subsets of items, fluid temperatures, and recipes.
///
/// Owned and mutated exclusively by the solver; immutable once returned.
/// Membership never shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttainabilitySet {
    items: BTreeSet<String>,
    fluids: BTreeMap<String, BTreeSet<Temperature>>,
    recipes: BTreeSet<String>,
    unrestricted: bool,
}

impl AttainabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The prune-level-0 result: every membership query answers yes, so the
    /// pruned output is identical to the unpruned input.
    pub fn unrestricted() -> Self {
        Self {
            unrestricted: true,
            ..Self::default()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Record an item as attainable. Returns whether the set grew.
    fn insert_item(&mut self, name: &str) -> bool {
        self.items.insert(name.to_string())
    }

    /// Record a fluid as attainable at a discrete temperature.
    fn insert_fluid(&mut self, name: &str, temperature: Temperature) -> bool {
        self.fluids
            .entry(name.to_string())
            .or_default()
            .insert(temperature)
    }

    /// Record a recipe as craftable.
    fn insert_recipe(&mut self, name: &str) -> bool {
        self.recipes.insert(name.to_string())
    }

    pub fn contains_item(&self, name: &str) -> bool {
        self.unrestricted || self.items.contains(name)
    }

    pub fn contains_recipe(&self, name: &str) -> bool {
        self.unrestricted || self.recipes.contains(name)
    }

    pub fn contains_fluid(&self, name: &str) -> bool {
        self.unrestricted || self.fluids.contains_key(name)
    }

    /// Whether some attainable temperature of `name` lies inside the
    /// inclusive `[minimum, maximum]` range. Missing bounds are open.
    pub fn fluid_matches(
        &self,
        name: &str,
        minimum: Option<Temperature>,
        maximum: Option<Temperature>,
    ) -> bool {
        if self.unrestricted {
            return true;
        }
        let Some(temperatures) = self.fluids.get(name) else {
            return false;
        };
        temperatures.iter().any(|&t| {
            minimum.is_none_or(|min| t >= min) && maximum.is_none_or(|max| t <= max)
        })
    }

    /// Whether an entity is reachable: some item that places it is
    /// attainable.
    pub fn entity_attainable(&self, entity: &EntityPrototype) -> bool {
        self.unrestricted
            || entity
                .items_to_place_this
                .iter()
                .any(|item| self.items.contains(item))
    }

    pub fn items(&self) -> &BTreeSet<String> {
        &self.items
    }

    pub fn recipes(&self) -> &BTreeSet<String> {
        &self.recipes
    }

    pub fn fluid_temperatures(&self, name: &str) -> Option<&BTreeSet<Temperature>> {
        self.fluids.get(name)
    }

    /// Total membership count across categories. Strictly increases with
    /// every productive relaxation pass.
    pub fn size(&self) -> usize {
        self.items.len()
            + self.recipes.len()
            + self.fluids.values().map(BTreeSet::len).sum::<usize>()
    }
}

/// Compute the attainability fixpoint for `registry` at `level`.
///
/// At [`PruneLevel::Researched`] this invokes the registry's `research_all`
/// hook first -- the single sanctioned registry mutation. Corrupt entity
/// energy configuration is rejected up front, before any result exists.
pub fn solve<R: PrototypeRegistry>(
    registry: &mut R,
    level: PruneLevel,
) -> Result<AttainabilitySet, SolveError> {
    validate_energy_sources(registry)?;

    if level == PruneLevel::None {
        return Ok(AttainabilitySet::unrestricted());
    }
    if level == PruneLevel::Researched {
        registry.research_all();
    }
    Ok(resolve(&*registry, level, AttainabilitySet::new()))
}

/// Run the seeding and relaxation phases from an existing set. Resolving
/// from an already-fixpointed seed changes nothing.
pub fn resolve<R: PrototypeRegistry>(
    registry: &R,
    level: PruneLevel,
    seed: AttainabilitySet,
) -> AttainabilitySet {
    if level == PruneLevel::None {
        return AttainabilitySet::unrestricted();
    }
    Solver::new(registry, level, seed).run()
}

/// Every crafting machine and beacon must declare a recognized energy
/// source; anything else is corrupt input.
fn validate_energy_sources<R: PrototypeRegistry>(registry: &R) -> Result<(), SolveError> {
    for entity in registry.entities().values() {
        if (entity.is_crafting_machine() || entity.is_beacon())
            && entity.energy_drain().is_none()
        {
            return Err(SolveError::MissingEnergySource(entity.name.clone()));
        }
    }
    Ok(())
}

/// Working state of one fixpoint run. The relaxation rules are separate
/// methods so each can be exercised in isolation.
struct Solver<'a, R: PrototypeRegistry> {
    registry: &'a R,
    level: PruneLevel,
    attainable: AttainabilitySet,
    /// Recipes currently unlocked: the registry's enabled flags plus
    /// unlocks of researched technologies.
    enabled_recipes: BTreeSet<String>,
    researched: BTreeSet<String>,
    /// Fluid-producing entities not yet proven reachable. Proven entities
    /// are dropped; attainability is monotone, so once is enough.
    fluid_sources: Vec<&'a EntityPrototype>,
}

impl<'a, R: PrototypeRegistry> Solver<'a, R> {
    fn new(registry: &'a R, level: PruneLevel, seed: AttainabilitySet) -> Self {
        let enabled_recipes = registry
            .enabled_recipes()
            .map(|recipe| recipe.name.clone())
            .collect();
        let mut researched = BTreeSet::new();
        let mut solver = Self {
            registry,
            level,
            attainable: seed,
            enabled_recipes,
            researched: BTreeSet::new(),
            fluid_sources: registry
                .entities()
                .values()
                .filter(|entity| entity.fluid_output.is_some())
                .collect(),
        };
        for tech in registry.technologies().values() {
            if tech.researched {
                researched.insert(tech.name.clone());
                solver
                    .enabled_recipes
                    .extend(tech.unlocks.iter().cloned());
            }
        }
        solver.researched = researched;
        solver
    }

    fn run(mut self) -> AttainabilitySet {
        self.seed();

        let mut passes = 0usize;
        loop {
            let mut progressed = self.relax_entities();
            progressed |= self.relax_recipes();
            if self.level == PruneLevel::Reachable {
                progressed |= self.relax_technologies();
            }
            passes += 1;
            if !progressed {
                break;
            }
        }
        tracing::debug!(passes, size = self.attainable.size(), "fixpoint reached");
        self.attainable
    }

    /// Seeding: world-given sources that need no crafting.
    fn seed(&mut self) {
        // Entities that spawn in the world and can be mined.
        let entities: Vec<&EntityPrototype> = self.registry.entities().values().collect();
        for entity in entities {
            if entity.autoplace {
                for product in &entity.mineable_products {
                    self.mark_product(product);
                }
            }
        }

        // Fluids with a real gas phase (steam and friends) leave boilers
        // through fluid boxes the exporter cannot inspect; treat them as
        // given at their default temperature.
        let seeded: Vec<(String, Temperature)> = self
            .registry
            .fluids()
            .values()
            .filter(|fluid| {
                fluid
                    .gas_temperature
                    .is_some_and(|gas| gas < Temperature::MAX)
            })
            .map(|fluid| (fluid.name.clone(), fluid.default_temperature))
            .collect();
        for (name, temperature) in seeded {
            self.attainable.insert_fluid(&name, temperature);
        }

        // Level 1 assumes full research: every unlocked recipe's products
        // count as obtainable even before proving the recipe craftable.
        if self.level == PruneLevel::Researched {
            let products: Vec<Product> = self
                .registry
                .enabled_recipes()
                .flat_map(|recipe| recipe.products.iter().cloned())
                .collect();
            for product in &products {
                self.mark_product(product);
            }
        }
    }

    /// Entity rule: a reachable fluid-producing entity makes its output
    /// fluid attainable. Each source is considered until proven, then
    /// dropped.
    fn relax_entities(&mut self) -> bool {
        let mut changed = false;
        let mut sources = std::mem::take(&mut self.fluid_sources);
        sources.retain(|entity| {
            if !self.attainable.entity_attainable(entity) {
                return true;
            }
            // `fluid_sources` only holds entities with an output.
            if let Some(output) = &entity.fluid_output {
                let temperature = output
                    .temperature
                    .or_else(|| self.default_temperature(&output.fluid));
                if let Some(temperature) = temperature {
                    changed |= self.attainable.insert_fluid(&output.fluid, temperature);
                }
            }
            false
        });
        self.fluid_sources = sources;
        changed
    }

    /// Recipe rule: an unlocked recipe with fully attainable ingredients
    /// becomes craftable and yields its products.
    fn relax_recipes(&mut self) -> bool {
        let mut changed = false;
        let candidates: Vec<&crate::prototype::RecipePrototype> = self
            .registry
            .recipes()
            .values()
            .filter(|recipe| {
                self.enabled_recipes.contains(&recipe.name)
                    && !self.attainable.contains_recipe(&recipe.name)
            })
            .collect();

        for recipe in candidates {
            if !recipe
                .ingredients
                .iter()
                .all(|ingredient| self.ingredient_attainable(ingredient))
            {
                continue;
            }
            changed |= self.attainable.insert_recipe(&recipe.name);
            for product in &recipe.products {
                changed |= self.mark_product(product);
            }
        }
        changed
    }

    /// Technology rule (strict pruning only): research completes once all
    /// prerequisites are researched and all science ingredients attainable,
    /// unlocking the technology's recipes.
    fn relax_technologies(&mut self) -> bool {
        let mut changed = false;
        let candidates: Vec<&crate::prototype::TechnologyPrototype> = self
            .registry
            .technologies()
            .values()
            .filter(|tech| tech.enabled && !self.researched.contains(&tech.name))
            .collect();

        for tech in candidates {
            let prerequisites_met = tech
                .prerequisites
                .iter()
                .all(|prereq| self.researched.contains(prereq));
            if !prerequisites_met {
                continue;
            }
            if !tech
                .research_ingredients
                .iter()
                .all(|ingredient| self.ingredient_attainable(ingredient))
            {
                continue;
            }
            self.researched.insert(tech.name.clone());
            self.enabled_recipes.extend(tech.unlocks.iter().cloned());
            changed = true;
        }
        changed
    }

    fn ingredient_attainable(&self, ingredient: &Ingredient) -> bool {
        match &ingredient.resource {
            IngredientResource::Item { name } => self.attainable.contains_item(name),
            IngredientResource::Fluid {
                name,
                minimum_temperature,
                maximum_temperature,
            } => self
                .attainable
                .fluid_matches(name, *minimum_temperature, *maximum_temperature),
        }
    }

    fn mark_product(&mut self, product: &Product) -> bool {
        match &product.resource {
            ProductResource::Item { name } => self.attainable.insert_item(name),
            ProductResource::Fluid { name, temperature } => {
                let temperature = temperature.or_else(|| self.default_temperature(name));
                match temperature {
                    Some(temperature) => self.attainable.insert_fluid(name, temperature),
                    // Unknown fluid reference; the loader rejects these, so
                    // stay conservative instead of inventing a temperature.
                    None => false,
                }
            }
        }
    }

    fn default_temperature(&self, fluid: &str) -> Option<Temperature> {
        self.registry
            .fluids()
            .get(fluid)
            .map(|prototype| prototype.default_temperature)
    }
}
