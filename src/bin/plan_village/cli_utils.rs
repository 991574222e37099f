use std::path::Path;
use std::str::FromStr;
use village_planner::errors::{PlannerError, PlannerResult};

/// Generic parser for delimited strings that return fixed-size arrays
pub fn parse_delimited<T, const N: usize>(input: &str, delimiter: char, type_name: &str) -> PlannerResult<[T; N]>
where
    T: Copy + Default + FromStr,
{
    let parts: Vec<&str> = input.split(delimiter).collect();
    if parts.len() != N {
        return Err(PlannerError::InvalidConfig {
            reason: format!(
                "Invalid {type_name} format '{input}'. Expected {N} {delimiter}-separated values"
            ),
        });
    }

    let mut result = [T::default(); N];
    for (i, part) in parts.iter().enumerate() {
        result[i] = part.trim().parse().map_err(|_| PlannerError::InvalidConfig {
            reason: format!("Invalid {type_name} value: '{part}'"),
        })?;
    }

    Ok(result)
}

/// Parse size string "WIDTHxDEPTH" with validation
pub fn parse_size(size_str: &str) -> PlannerResult<(u32, u32)> {
    let [width, depth] = parse_delimited::<u32, 2>(size_str, 'x', "size")?;

    if width == 0 || depth == 0 {
        return Err(PlannerError::InvalidConfig {
            reason: "Width and depth must be greater than 0".to_string(),
        });
    }

    if width > 2048 || depth > 2048 {
        return Err(PlannerError::InvalidConfig {
            reason: "Width and depth must not exceed 2048".to_string(),
        });
    }

    Ok((width, depth))
}

/// Parse origin string "X,Z" in global block coordinates
pub fn parse_origin(origin_str: &str) -> PlannerResult<(i32, i32)> {
    let [x, z] = parse_delimited::<i32, 2>(origin_str, ',', "origin")?;
    Ok((x, z))
}

/// Validate tree density and clamp to valid range
pub fn validate_density(density: f64) -> f64 {
    if !(0.0..=1.0).contains(&density) {
        println!(
            "Warning: Tree density {density} is out of range [0.0, 1.0], clamping to valid range"
        );
        density.clamp(0.0, 1.0)
    } else {
        density
    }
}

/// Plan files are written relative to the plans directory
pub fn validate_output_path(filename: &str) -> PlannerResult<()> {
    let path = Path::new(filename);
    if path.is_absolute() {
        return Err(PlannerError::InvalidConfig {
            reason: format!(
                "Output path must be relative to the plans/ directory, got absolute path: {filename}"
            ),
        });
    }

    if filename.contains("..") {
        return Err(PlannerError::InvalidConfig {
            reason: "Output path cannot contain '..'".to_string(),
        });
    }

    Ok(())
}
