//! Contracts with the systems around the planner: the structure catalog that
//! knows building sizes and the world writer that turns a plan into edits.

use crate::config::PlannerConfig;
use crate::encyclopedia::Encyclopedia;
use crate::errors::{PlannerError, PlannerResult};
use crate::map::VillagePlan;
use bevy::log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;

/// Horizontal size of a structure template, in blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub size_x: u32,
    pub size_z: u32,
}

impl Footprint {
    pub fn square(edge: u32) -> Self {
        Self {
            size_x: edge,
            size_z: edge,
        }
    }

    pub fn longest_edge(&self) -> u32 {
        self.size_x.max(self.size_z)
    }
}

/// Maps archetype names to the footprints of their available structures
pub trait StructureCatalog {
    fn footprints(&self, archetype: &str) -> Vec<Footprint>;
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct StaticStructureCatalog {
    entries: HashMap<String, Vec<Footprint>>,
}

impl StaticStructureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// One square structure per archetype, sized by its configured footprint
    pub fn from_config(config: &PlannerConfig) -> Self {
        let mut catalog = Self::new();
        for archetype in &config.archetypes {
            catalog.insert(&archetype.name, Footprint::square(archetype.footprint));
        }
        catalog
    }

    pub fn insert(&mut self, archetype: &str, footprint: Footprint) {
        self.entries
            .entry(archetype.to_string())
            .or_default()
            .push(footprint);
    }
}

impl StructureCatalog for StaticStructureCatalog {
    fn footprints(&self, archetype: &str) -> Vec<Footprint> {
        self.entries.get(archetype).cloned().unwrap_or_default()
    }
}

/// Every archetype needs at least one structure. Structures wider than the
/// clearance square are allowed but reported.
pub fn check_catalog(catalog: &dyn StructureCatalog, encyclopedia: &Encyclopedia) -> PlannerResult<()> {
    for archetype in encyclopedia.archetypes() {
        let footprints = catalog.footprints(&archetype.name);
        if footprints.is_empty() {
            return Err(PlannerError::InvalidConfig {
                reason: format!("Structure catalog has no structure for archetype '{}'", archetype.name),
            });
        }
        let clearance = archetype.exclusion_radius.get() * 2 - 1;
        if let Some(widest) = footprints.iter().map(Footprint::longest_edge).max() {
            if widest > clearance {
                warn!(
                    "Archetype '{}' has a {widest}-block structure but only {clearance} blocks of clearance",
                    archetype.name
                );
            }
        }
    }
    Ok(())
}

/// Consumes a finished plan and performs the physical edits
pub trait WorldWriter {
    fn write_plan(&mut self, plan: &VillagePlan) -> PlannerResult<()>;
}

/// Writes the plan to a bincode file for a later build step
#[derive(Debug, Clone)]
pub struct PlanFileWriter {
    pub path: PathBuf,
}

impl PlanFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorldWriter for PlanFileWriter {
    fn write_plan(&mut self, plan: &VillagePlan) -> PlannerResult<()> {
        plan.save_to_path(&self.path)?;
        info!(
            "Wrote plan with {} buildings to {}",
            plan.buildings.len(),
            self.path.display()
        );
        Ok(())
    }
}
