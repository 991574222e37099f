use super::range_types::*;
use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::constants::*;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// What to do with a building whose road cannot reach the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachablePolicy {
    /// Place it anyway and record it as disconnected
    #[default]
    Keep,
    /// Drop the candidate and keep sampling
    Discard,
}

/// Top-level planner configuration, loaded from TOML
// NOTE: When adding new fields, update planner.toml in the project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlannerConfig {
    #[validate(range(max = 1000))]
    pub goal_buildings: u32,
    pub seed: u64,
    pub retry_multiplier: RetryMultiplier,
    pub slope_threshold: SlopeThreshold,
    pub accept_threshold: AcceptThreshold,
    pub unreachable: UnreachablePolicy,
    #[validate(range(min = 1))]
    pub lamp_spacing: u32,
    #[validate(nested)]
    pub router: RouterConfig,
    #[validate(length(min = 1), nested)]
    pub archetypes: Vec<ArchetypeConfig>,
    #[validate(nested)]
    pub interest: Vec<InterestConfig>,
}

/// Road and bridge routing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RouterConfig {
    /// Largest height difference a flat road step may climb
    #[validate(range(min = 0, max = 64))]
    pub max_road_step: i32,
    /// Bridge spans are probed at multiples of this many cells
    #[validate(range(min = 1, max = 64))]
    pub bridge_probe_step: u32,
    #[validate(range(max = 256))]
    pub max_bridge_span: u32,
    /// Extra cost per bridged cell; must exceed one cardinal road step
    #[validate(range(min = 11))]
    pub bridge_cell_premium: u32,
}

/// One building archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ArchetypeConfig {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub exclusion_radius: ExclusionRadius,
    /// Archetypes with higher priority are tried first at each candidate point
    #[serde(default)]
    pub priority: i32,
    /// Foundation edge length in cells
    #[serde(default = "default_footprint")]
    #[validate(range(min = 1, max = 64))]
    pub footprint: u32,
}

/// Attraction/repulsion parameters for one ordered archetype pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_distances"))]
pub struct InterestConfig {
    pub from: String,
    pub to: String,
    #[validate(range(min = 0.0))]
    pub min_dist: f64,
    pub max_dist: f64,
    pub break_even: f64,
    /// Also apply these parameters to the `to -> from` direction
    #[serde(default = "default_symmetric")]
    pub symmetric: bool,
}

fn default_footprint() -> u32 {
    DEFAULT_FOOTPRINT
}

fn default_symmetric() -> bool {
    true
}

fn validate_distances(entry: &InterestConfig) -> Result<(), ValidationError> {
    if !(entry.min_dist <= entry.max_dist) {
        return Err(ValidationError::new("min_dist_exceeds_max_dist"));
    }
    if !(entry.break_even > 0.0) {
        return Err(ValidationError::new("break_even_not_positive"));
    }
    Ok(())
}

impl ArchetypeConfig {
    pub fn new(name: &str, exclusion_radius: u32, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            exclusion_radius: ExclusionRadius::new(exclusion_radius),
            priority,
            footprint: DEFAULT_FOOTPRINT,
        }
    }
}

impl InterestConfig {
    pub fn symmetric(from: &str, to: &str, min_dist: f64, max_dist: f64, break_even: f64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            min_dist,
            max_dist,
            break_even,
            symmetric: true,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_road_step: DEFAULT_MAX_ROAD_STEP,
            bridge_probe_step: DEFAULT_BRIDGE_PROBE_STEP,
            max_bridge_span: DEFAULT_MAX_BRIDGE_SPAN,
            bridge_cell_premium: DEFAULT_BRIDGE_CELL_PREMIUM,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let archetypes = vec![
            ArchetypeConfig::new("small_house", 7, 1),
            ArchetypeConfig::new("farm", 7, 0),
        ];
        let interest = vec![
            InterestConfig::symmetric("small_house", "small_house", 7.0, 100.0, 17.0),
            InterestConfig::symmetric("small_house", "farm", 7.0, 100.0, 17.0),
            InterestConfig::symmetric("farm", "farm", 7.0, 100.0, 17.0),
        ];
        Self {
            goal_buildings: 24,
            seed: 0,
            retry_multiplier: RetryMultiplier::default(),
            slope_threshold: SlopeThreshold::new(DEFAULT_SLOPE_THRESHOLD),
            accept_threshold: AcceptThreshold::new(DEFAULT_ACCEPT_THRESHOLD),
            unreachable: UnreachablePolicy::default(),
            lamp_spacing: DEFAULT_LAMP_SPACING,
            router: RouterConfig::default(),
            archetypes,
            interest,
        }
    }
}

impl PlannerConfig {
    /// Run field validation, flattening failures into a readable error
    pub fn check(&self) -> PlannerResult<()> {
        self.validate().map_err(|errors| PlannerError::InvalidConfig {
            reason: describe_validation_errors(&errors),
        })
    }
}

fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut details: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.code.to_string()).collect();
            format!("{field}: {}", error_msgs.join(", "))
        })
        .collect();
    for (field, kind) in errors.errors() {
        if let validator::ValidationErrorsKind::Struct(inner) = kind {
            details.push(format!("{field}.{}", describe_validation_errors(inner)));
        } else if let validator::ValidationErrorsKind::List(items) = kind {
            for (index, inner) in items {
                details.push(format!("{field}[{index}].{}", describe_validation_errors(inner)));
            }
        }
    }
    details.sort();
    details.join("; ")
}
