//! Building archetypes and the pairwise interest table used to score sites.
//!
//! Archetype names are resolved to dense [`ArchetypeId`]s once, when the
//! encyclopedia is built from configuration. After that every lookup is an
//! index into an `n x n` table, so a missing pair can only surface as a load
//! error, never mid-run.

use crate::config::PlannerConfig;
use crate::config::range_types::ExclusionRadius;
use crate::errors::{PlannerError, PlannerResult};
use crate::map::PlacedBuilding;
use crate::terrain::GridCell;
use crate::terrain::constants::NEUTRAL_SITE_SCORE;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier of an archetype inside one encyclopedia
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
pub struct ArchetypeId(u16);

impl ArchetypeId {
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub name: String,
    pub exclusion_radius: ExclusionRadius,
    pub priority: i32,
    pub footprint: u32,
}

/// Result of evaluating the potential at one distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interest {
    /// The distance violates the pair's hard spacing bounds
    OutOfBounds,
    /// Normalized interest in [-1, 1]; positive is attractive
    Within(f64),
}

impl Interest {
    pub fn is_out_of_bounds(self) -> bool {
        matches!(self, Interest::OutOfBounds)
    }
}

/// Suitability of a candidate site for one archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Suitability {
    Unsuitable,
    /// Score in [0, 1]
    Score(f64),
}

/// Lennard-Jones style attraction/repulsion between two archetypes.
///
/// Repulsive below `break_even`, attractive above it, strongest attraction at
/// the equilibrium distance `2^(1/6) * break_even`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractRepulse {
    min_dist: f64,
    max_dist: f64,
    break_even: f64,
}

impl AttractRepulse {
    pub fn new(min_dist: f64, max_dist: f64, break_even: f64) -> PlannerResult<Self> {
        if !(min_dist >= 0.0 && min_dist <= max_dist) {
            return Err(PlannerError::InvalidConfig {
                reason: format!("Interest bounds [{min_dist}, {max_dist}] are not an ordered range"),
            });
        }
        if !(break_even > 0.0 && break_even.is_finite()) {
            return Err(PlannerError::InvalidConfig {
                reason: format!("Break-even distance {break_even} must be positive"),
            });
        }
        Ok(Self {
            min_dist,
            max_dist,
            break_even,
        })
    }

    pub fn min_dist(&self) -> f64 {
        self.min_dist
    }

    pub fn max_dist(&self) -> f64 {
        self.max_dist
    }

    pub fn break_even(&self) -> f64 {
        self.break_even
    }

    pub fn in_bounds(&self, distance: f64) -> bool {
        distance >= self.min_dist && distance <= self.max_dist
    }

    /// Raw potential `4((b/d)^12 - (b/d)^6)`; zero at break-even, minimum -1
    pub fn potential(&self, distance: f64) -> f64 {
        let ratio6 = (self.break_even / distance).powi(6);
        4.0 * (ratio6 * ratio6 - ratio6)
    }

    pub fn equilibrium_distance(&self) -> f64 {
        2f64.powf(1.0 / 6.0) * self.break_even
    }

    pub fn interest(&self, distance: f64) -> Interest {
        if !self.in_bounds(distance) {
            return Interest::OutOfBounds;
        }
        if distance <= 0.0 {
            return Interest::Within(-1.0);
        }
        let well_depth = self.potential(self.equilibrium_distance());
        let normalized = self.potential(distance) / well_depth;
        Interest::Within(normalized.clamp(-1.0, 1.0))
    }
}

/// Archetypes plus their dense pairwise interest table
#[derive(Debug, Clone)]
pub struct Encyclopedia {
    archetypes: Vec<Archetype>,
    by_name: HashMap<String, ArchetypeId>,
    /// Row-major `from * n + to`
    table: Vec<AttractRepulse>,
}

impl Encyclopedia {
    /// Resolve names and build the interest table, failing on any gap or conflict
    pub fn from_config(config: &PlannerConfig) -> PlannerResult<Self> {
        let mut archetypes = Vec::with_capacity(config.archetypes.len());
        let mut by_name = HashMap::new();
        for (index, entry) in config.archetypes.iter().enumerate() {
            let id = u16::try_from(index)
                .map(ArchetypeId)
                .map_err(|_| PlannerError::InvalidConfig {
                    reason: format!("Too many archetypes ({})", config.archetypes.len()),
                })?;
            if by_name.insert(entry.name.clone(), id).is_some() {
                return Err(PlannerError::DuplicateArchetype {
                    name: entry.name.clone(),
                });
            }
            archetypes.push(Archetype {
                id,
                name: entry.name.clone(),
                exclusion_radius: entry.exclusion_radius,
                priority: entry.priority,
                footprint: entry.footprint,
            });
        }

        let n = archetypes.len();
        let mut slots: Vec<Option<AttractRepulse>> = vec![None; n * n];
        let resolve = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| PlannerError::UnknownArchetype {
                    name: name.to_string(),
                })
        };
        for entry in &config.interest {
            let from = resolve(&entry.from)?;
            let to = resolve(&entry.to)?;
            let params = AttractRepulse::new(entry.min_dist, entry.max_dist, entry.break_even)?;

            let mut targets = vec![(from, to)];
            if entry.symmetric && from != to {
                targets.push((to, from));
            }
            for (a, b) in targets {
                let slot = &mut slots[a.index() * n + b.index()];
                if slot.is_some() {
                    return Err(PlannerError::DuplicateInterest {
                        from: archetypes[a.index()].name.clone(),
                        to: archetypes[b.index()].name.clone(),
                    });
                }
                *slot = Some(params);
            }
        }

        let mut table = Vec::with_capacity(n * n);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(params) => table.push(params),
                None => {
                    return Err(PlannerError::MissingInterest {
                        from: archetypes[index / n].name.clone(),
                        to: archetypes[index % n].name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            archetypes,
            by_name,
            table,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<ArchetypeId> {
        self.by_name.get(name).copied()
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub fn names(&self) -> Vec<String> {
        self.archetypes.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn pair(&self, from: ArchetypeId, to: ArchetypeId) -> Option<&AttractRepulse> {
        let n = self.archetypes.len();
        if from.index() >= n || to.index() >= n {
            return None;
        }
        self.table.get(from.index() * n + to.index())
    }

    /// Interest of `from` in a neighbour of archetype `to` at `distance`
    pub fn interest(&self, from: ArchetypeId, to: ArchetypeId, distance: f64) -> Interest {
        self.pair(from, to)
            .map_or(Interest::OutOfBounds, |params| params.interest(distance))
    }

    /// Score a candidate site against every placed building.
    ///
    /// Any pair outside its spacing bounds (checked in both directions) makes
    /// the site unsuitable. Otherwise the mean interest is mapped to [0, 1].
    pub fn score_site(
        &self,
        archetype: ArchetypeId,
        cell: GridCell,
        placed: &[PlacedBuilding],
    ) -> Suitability {
        if placed.is_empty() {
            return Suitability::Score(NEUTRAL_SITE_SCORE);
        }
        let mut total = 0.0;
        for building in placed {
            let distance = cell.distance(&building.position);
            let forward = self.interest(archetype, building.archetype, distance);
            let backward = self.interest(building.archetype, archetype, distance);
            match (forward, backward) {
                (Interest::Within(value), Interest::Within(_)) => total += value,
                _ => return Suitability::Unsuitable,
            }
        }
        let mean = total / placed.len() as f64;
        Suitability::Score(((mean + 1.0) / 2.0).clamp(0.0, 1.0))
    }

    /// Archetype ids grouped by descending priority, ids ascending within a group
    pub fn priority_groups(&self) -> Vec<Vec<ArchetypeId>> {
        let mut ordered: Vec<&Archetype> = self.archetypes.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

        let mut groups: Vec<Vec<ArchetypeId>> = Vec::new();
        let mut current_priority = None;
        for archetype in ordered {
            if current_priority != Some(archetype.priority) {
                groups.push(Vec::new());
                current_priority = Some(archetype.priority);
            }
            if let Some(group) = groups.last_mut() {
                group.push(archetype.id);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchetypeConfig, InterestConfig};
    use crate::map::Connection;

    fn village_config() -> PlannerConfig {
        PlannerConfig::default()
    }

    fn placed(x: u32, z: u32, archetype: ArchetypeId) -> PlacedBuilding {
        PlacedBuilding {
            position: GridCell::new(x, z),
            archetype,
            connection: Connection::Connected,
        }
    }

    #[test]
    fn test_potential_shape() {
        let pair = AttractRepulse::new(7.0, 100.0, 17.0).unwrap();
        assert!(pair.potential(17.0).abs() < 1e-12);
        let eq = pair.equilibrium_distance();
        assert!((pair.potential(eq) + 1.0).abs() < 1e-12);
        assert!(pair.potential(10.0) > 0.0);
    }

    #[test]
    fn test_interest_normalization() {
        let pair = AttractRepulse::new(7.0, 100.0, 17.0).unwrap();
        let Interest::Within(at_eq) = pair.interest(pair.equilibrium_distance()) else {
            panic!("equilibrium distance should be in bounds");
        };
        assert!((at_eq - 1.0).abs() < 1e-9);

        let Interest::Within(close) = pair.interest(7.0) else {
            panic!("min distance is inclusive");
        };
        assert_eq!(close, -1.0);

        let Interest::Within(far) = pair.interest(100.0) else {
            panic!("max distance is inclusive");
        };
        assert!(far > 0.0 && far < 0.01);
    }

    #[test]
    fn test_interest_out_of_bounds() {
        let pair = AttractRepulse::new(7.0, 100.0, 17.0).unwrap();
        assert!(pair.interest(6.99).is_out_of_bounds());
        assert!(pair.interest(100.01).is_out_of_bounds());
    }

    #[test]
    fn test_invalid_pair_rejected() {
        assert!(AttractRepulse::new(10.0, 5.0, 3.0).is_err());
        assert!(AttractRepulse::new(1.0, 5.0, 0.0).is_err());
    }

    #[test]
    fn test_from_config_fills_symmetric_pairs() {
        let encyclopedia = Encyclopedia::from_config(&village_config()).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        let farm = encyclopedia.lookup("farm").unwrap();
        assert_eq!(encyclopedia.len(), 2);
        assert_eq!(
            encyclopedia.pair(farm, house),
            encyclopedia.pair(house, farm)
        );
    }

    #[test]
    fn test_missing_pair_fails_fast() {
        let mut config = village_config();
        config.interest.retain(|entry| entry.from != "farm" || entry.to != "farm");
        let err = Encyclopedia::from_config(&config).unwrap_err();
        assert!(matches!(err, PlannerError::MissingInterest { ref from, ref to } if from == "farm" && to == "farm"));
    }

    #[test]
    fn test_unknown_archetype_fails_fast() {
        let mut config = village_config();
        config
            .interest
            .push(InterestConfig::symmetric("tower", "farm", 7.0, 100.0, 17.0));
        assert!(matches!(
            Encyclopedia::from_config(&config),
            Err(PlannerError::UnknownArchetype { .. })
        ));
    }

    #[test]
    fn test_conflicting_entries_fail_fast() {
        let mut config = village_config();
        let mut reverse = InterestConfig::symmetric("farm", "small_house", 5.0, 50.0, 10.0);
        reverse.symmetric = false;
        config.interest.push(reverse);
        assert!(matches!(
            Encyclopedia::from_config(&config),
            Err(PlannerError::DuplicateInterest { .. })
        ));
    }

    #[test]
    fn test_duplicate_archetype_fails_fast() {
        let mut config = village_config();
        config.archetypes.push(ArchetypeConfig::new("farm", 3, 0));
        assert!(matches!(
            Encyclopedia::from_config(&config),
            Err(PlannerError::DuplicateArchetype { .. })
        ));
    }

    #[test]
    fn test_asymmetric_entries_resolve() {
        let mut config = village_config();
        config.interest = vec![
            InterestConfig::symmetric("small_house", "small_house", 7.0, 100.0, 17.0),
            InterestConfig::symmetric("farm", "farm", 7.0, 100.0, 17.0),
            InterestConfig {
                symmetric: false,
                ..InterestConfig::symmetric("farm", "small_house", 10.0, 40.0, 20.0)
            },
            InterestConfig {
                symmetric: false,
                ..InterestConfig::symmetric("small_house", "farm", 7.0, 100.0, 17.0)
            },
        ];
        let encyclopedia = Encyclopedia::from_config(&config).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        let farm = encyclopedia.lookup("farm").unwrap();
        assert_eq!(encyclopedia.pair(farm, house).unwrap().max_dist(), 40.0);
        assert_eq!(encyclopedia.pair(house, farm).unwrap().max_dist(), 100.0);
    }

    #[test]
    fn test_score_site_neutral_when_empty() {
        let encyclopedia = Encyclopedia::from_config(&village_config()).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        assert_eq!(
            encyclopedia.score_site(house, GridCell::new(5, 5), &[]),
            Suitability::Score(NEUTRAL_SITE_SCORE)
        );
    }

    #[test]
    fn test_score_site_rejects_any_out_of_bounds_pair() {
        let encyclopedia = Encyclopedia::from_config(&village_config()).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        let buildings = vec![placed(0, 0, house), placed(40, 0, house)];
        // Three cells from the second house
        assert_eq!(
            encyclopedia.score_site(house, GridCell::new(37, 0), &buildings),
            Suitability::Unsuitable
        );
    }

    #[test]
    fn test_score_site_prefers_equilibrium() {
        let encyclopedia = Encyclopedia::from_config(&village_config()).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        let buildings = vec![placed(0, 0, house)];
        let Suitability::Score(near_eq) = encyclopedia.score_site(house, GridCell::new(19, 0), &buildings)
        else {
            panic!("expected a score");
        };
        let Suitability::Score(crowded) = encyclopedia.score_site(house, GridCell::new(8, 0), &buildings)
        else {
            panic!("expected a score");
        };
        assert!(near_eq > 0.95);
        assert!(crowded < 0.1);
    }

    #[test]
    fn test_score_site_checks_reverse_direction() {
        let mut config = village_config();
        config.interest = vec![
            InterestConfig::symmetric("small_house", "small_house", 7.0, 100.0, 17.0),
            InterestConfig::symmetric("farm", "farm", 7.0, 100.0, 17.0),
            InterestConfig {
                symmetric: false,
                ..InterestConfig::symmetric("small_house", "farm", 7.0, 100.0, 17.0)
            },
            InterestConfig {
                symmetric: false,
                ..InterestConfig::symmetric("farm", "small_house", 7.0, 20.0, 17.0)
            },
        ];
        let encyclopedia = Encyclopedia::from_config(&config).unwrap();
        let house = encyclopedia.lookup("small_house").unwrap();
        let farm = encyclopedia.lookup("farm").unwrap();
        let buildings = vec![placed(0, 0, farm)];
        // The house is happy at 30 cells but the farm only tolerates 20
        assert_eq!(
            encyclopedia.score_site(house, GridCell::new(30, 0), &buildings),
            Suitability::Unsuitable
        );
    }

    #[test]
    fn test_priority_groups() {
        let mut config = village_config();
        config.archetypes.push(ArchetypeConfig::new("well", 3, 1));
        for other in ["small_house", "farm", "well"] {
            config
                .interest
                .push(InterestConfig::symmetric("well", other, 7.0, 100.0, 17.0));
        }
        let encyclopedia = Encyclopedia::from_config(&config).unwrap();
        let groups = encyclopedia.priority_groups();
        let house = encyclopedia.lookup("small_house").unwrap();
        let farm = encyclopedia.lookup("farm").unwrap();
        let well = encyclopedia.lookup("well").unwrap();
        assert_eq!(groups, vec![vec![house, well], vec![farm]]);
    }
}
