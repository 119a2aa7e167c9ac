//! Quick-look PNG export of a single map plane

use image::{ImageBuffer, Luma};
use std::path::Path;

use crate::io::error::{MappingError, Result, invalid_parameter};
use crate::spatial::grid::Grid;

/// Export plane `z` of a grid as an 8-bit grayscale PNG
///
/// The plane minimum maps to black and the maximum to white; a flat plane is
/// written mid-gray. Declination grows upwards, so row 0 of the file is the
/// last `y` of the grid.
///
/// # Errors
///
/// Returns an error if:
/// - The plane index is out of range or the grid is empty
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_plane_as_png(grid: &Grid, z: usize, output_path: &Path) -> Result<()> {
    let plane = grid.plane(z);
    if plane.is_empty() {
        return Err(invalid_parameter(
            "plane",
            &z,
            &format!("grid {:?} has no such plane", grid.dim()),
        ));
    }

    let (sx, sy) = (plane.size_x(), plane.size_y());
    let data = plane.as_array();
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let img = ImageBuffer::from_fn(sx as u32, sy as u32, |px, py| {
        let value = data
            .get([px as usize, sy - 1 - py as usize])
            .copied()
            .unwrap_or(min);
        let level = if span > 0.0 {
            ((value - min) / span * 255.0).round()
        } else {
            128.0
        };
        Luma([level.clamp(0.0, 255.0) as u8])
    });

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MappingError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path)
        .map_err(|e| MappingError::PreviewExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
