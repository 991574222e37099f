//! Raster dump of a plan for eyeballing: terrain shaded by height, water,
//! unbuildable land, roads, bridges and buildings with their exclusion square.

use crate::encyclopedia::Encyclopedia;
use crate::errors::PlannerResult;
use crate::map::{Connection, VillagePlan};
use crate::terrain::{GridCell, TerrainModel};
use image::{Rgb, RgbImage};
use std::path::Path;

const WATER: [u8; 3] = [40, 90, 200];
const ROAD: [u8; 3] = [150, 110, 60];
const LAMP: [u8; 3] = [255, 220, 80];
const BRIDGE: [u8; 3] = [120, 60, 20];
const BUILDING: [u8; 3] = [220, 30, 30];
const UNREACHABLE: [u8; 3] = [230, 0, 230];
const EXCLUSION: [u8; 3] = [255, 150, 150];

/// Render one pixel per grid cell
pub fn render_plan(terrain: &TerrainModel, encyclopedia: &Encyclopedia, plan: &VillagePlan) -> RgbImage {
    let (width, depth) = (terrain.width(), terrain.depth());
    let mut img = RgbImage::new(width, depth);

    // normalize height to [0,1]
    let (mut min, mut max) = (i32::MAX, i32::MIN);
    for (_, height) in terrain.heights.iter() {
        min = min.min(*height);
        max = max.max(*height);
    }
    let span = (max - min).max(1) as f32;

    for (cell, height) in terrain.heights.iter() {
        let shade = ((*height - min) as f32 / span * 155.0) as u8 + 60;
        let color = if !terrain.is_land(cell) {
            WATER
        } else if terrain.is_buildable(cell) {
            [shade / 3, shade, shade / 3]
        } else {
            [shade, shade, shade]
        };
        img.put_pixel(cell.x, cell.z, Rgb(color));
    }

    for building in &plan.buildings {
        let Some(archetype) = encyclopedia.archetype(building.archetype) else {
            continue;
        };
        draw_square_outline(&mut img, building.position, archetype.exclusion_radius.get(), EXCLUSION);
    }

    for tile in &plan.road_tiles {
        put(&mut img, tile.cell, if tile.lamp { LAMP } else { ROAD });
    }
    if plan.road_tiles.is_empty() {
        for (cell, road) in plan.network.roads().iter() {
            if *road {
                put(&mut img, cell, ROAD);
            }
        }
    }

    for bridge in &plan.bridges {
        for point in &bridge.points {
            put(&mut img, GridCell::new(point.x, point.z), BRIDGE);
        }
    }

    for building in &plan.buildings {
        let color = match building.connection {
            Connection::Unreachable => UNREACHABLE,
            _ => BUILDING,
        };
        put(&mut img, building.position, color);
    }

    img
}

pub fn save_plan_image<P: AsRef<Path>>(
    path: P,
    terrain: &TerrainModel,
    encyclopedia: &Encyclopedia,
    plan: &VillagePlan,
) -> PlannerResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    render_plan(terrain, encyclopedia, plan).save(path)?;
    Ok(())
}

fn put(img: &mut RgbImage, cell: GridCell, color: [u8; 3]) {
    if cell.x < img.width() && cell.z < img.height() {
        img.put_pixel(cell.x, cell.z, Rgb(color));
    }
}

/// Border of the square with |dx| < radius and |dz| < radius
fn draw_square_outline(img: &mut RgbImage, center: GridCell, radius: u32, color: [u8; 3]) {
    let reach = radius.saturating_sub(1) as i32;
    for d in -reach..=reach {
        for (dx, dz) in [(d, -reach), (d, reach), (-reach, d), (reach, d)] {
            if let Some(cell) = center.offset(dx, dz) {
                put(img, cell, color);
            }
        }
    }
}
