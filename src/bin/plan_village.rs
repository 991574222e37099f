use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use village_planner::config::{PlannerConfig, load_config, load_config_from, save_config};
use village_planner::diagnostics::save_plan_image;
use village_planner::encyclopedia::Encyclopedia;
use village_planner::errors::PlannerResult;
use village_planner::map::{Connection, VillagePlan};
use village_planner::terrain::{BuildArea, TerrainModel};
use village_planner::world::{PlanFileWriter, StaticStructureCatalog, WorldWriter, check_catalog};
use village_planner::plan_village;

mod plan_village {
    pub mod cli_utils;
    pub mod terrain_builder;
}

use plan_village::cli_utils::*;
use plan_village::terrain_builder::TerrainBuilder;

#[derive(Parser, Clone)]
#[command(name = "plan_village")]
#[command(about = "Plan a village on generated block terrain")]
struct Args {
    /// Planner configuration file (defaults to the user config, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to the user config directory
    #[arg(long)]
    save_config: bool,

    /// Build area size in blocks (format: WIDTHxDEPTH)
    #[arg(long, default_value = "128x128")]
    size: String,

    /// Global block coordinates of the build area corner (format: X,Z)
    #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
    origin: String,

    /// Terrain type preset (flat, hills, lakes, mountains, valleys) or perlin/ridged
    #[arg(long, default_value = "hills")]
    terrain_type: String,

    /// Random seed for both terrain and planning
    #[arg(long)]
    seed: Option<u64>,

    /// Number of buildings to place (overrides the config)
    #[arg(long)]
    goal: Option<u32>,

    /// Terrain amplitude (height variation in blocks)
    #[arg(long, default_value = "10.0")]
    amplitude: f64,

    /// Base frequency for noise (terrain feature density)
    #[arg(long, default_value = "0.02")]
    frequency: f64,

    /// Number of noise octaves for detail
    #[arg(long, default_value = "4")]
    octaves: u32,

    /// Flood ground below this height
    #[arg(long)]
    sea_level: Option<i32>,

    /// Tree trunk density (0.0-1.0)
    #[arg(long)]
    trees: Option<f64>,

    /// Output file path relative to the plans/ directory
    #[arg(long, default_value = "village.bin")]
    output: String,

    /// Also render the plan to this PNG file
    #[arg(long)]
    image: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> PlannerResult<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(goal) = args.goal {
        config.goal_buildings = goal;
    }
    config.check()?;
    Ok(config)
}

fn main() -> PlannerResult<()> {
    let args = Args::parse();

    // Parse and validate all CLI arguments
    let (width, depth) = parse_size(&args.size)?;
    let (origin_x, origin_z) = parse_origin(&args.origin)?;
    let tree_density = args.trees.map(validate_density);
    validate_output_path(&args.output)?;

    let config = resolve_config(&args)?;
    if args.save_config {
        save_config(&config)?;
    }

    let encyclopedia = Encyclopedia::from_config(&config)?;
    check_catalog(&StaticStructureCatalog::from_config(&config), &encyclopedia)?;

    // Build terrain generator using builder pattern
    let generator = TerrainBuilder::new(args.terrain_type.clone())
        .seed(args.seed.map(|seed| seed as u32))
        .amplitude(args.amplitude)
        .frequency(args.frequency)
        .octaves(args.octaves)
        .sea_level(args.sea_level)
        .trees(tree_density)
        .build()?;
    let source = generator.generate(origin_x, origin_z, width, depth)?;
    let area = BuildArea::new(
        origin_x,
        origin_z,
        origin_x + width as i32,
        origin_z + depth as i32,
    );

    let plan = plan_village(&source, area, &config)?;

    let full_path = VillagePlan::get_plans_dir()?.join(&args.output);
    PlanFileWriter::new(&full_path).write_plan(&plan)?;

    if let Some(image_path) = &args.image {
        let terrain = TerrainModel::from_source(&source, &area, config.slope_threshold)?;
        save_plan_image(image_path, &terrain, &encyclopedia, &plan)?;
    }

    print_plan_summary(&plan, &config, &full_path, args.image.as_deref());
    Ok(())
}

fn print_plan_summary(plan: &VillagePlan, config: &PlannerConfig, full_path: &Path, image: Option<&Path>) {
    println!("Plan saved successfully to: {}", full_path.display());
    if let Some(image) = image {
        println!("Diagnostic image saved to: {}", image.display());
    }
    println!("\nPlan summary:");
    println!(
        "  Area: ({}, {}) to ({}, {})",
        plan.area.start_x, plan.area.start_z, plan.area.end_x, plan.area.end_z
    );
    println!("  Seed: {}", config.seed);
    println!(
        "  Buildings: {} placed of {} requested ({} unreachable)",
        plan.buildings.len(),
        config.goal_buildings,
        plan.unreachable_count()
    );
    println!("  Road cells: {}", plan.network.road_cell_count());
    println!(
        "  Lamps: {}",
        plan.road_tiles.iter().filter(|tile| tile.lamp).count()
    );
    println!(
        "  Bridges: {} spanning {} cells",
        plan.bridges.len(),
        plan.bridges.iter().map(|bridge| bridge.points.len()).sum::<usize>()
    );
    println!("  Foundations: {}", plan.foundations.len());

    if !plan.buildings.is_empty() {
        let mut type_counts = BTreeMap::new();
        for building in &plan.buildings {
            let name = plan.archetype_name(building).unwrap_or("unknown");
            *type_counts.entry(name).or_insert(0) += 1;
        }
        println!("  Archetypes:");
        for (name, count) in type_counts {
            println!("    {name}: {count} buildings");
        }
    }

    for (i, (building, (x, z))) in plan.global_positions().enumerate() {
        let connection = match building.connection {
            Connection::Root => "root",
            Connection::Connected => "connected",
            Connection::Unreachable => "unreachable",
        };
        println!(
            "    Building {}: {} at ({x}, {z}), {connection}",
            i + 1,
            plan.archetype_name(building).unwrap_or("unknown")
        );
    }
}
