//! PNG export of a horizontal world slice

use crate::algorithm::bitset::StateId;
use crate::io::error::{GenerationError, Result, invalid_parameter};
use crate::math::noise::lattice_hash;
use crate::spatial::chunk_map::ChunkMap;
use image::{ImageBuffer, Rgba};
use std::path::Path;

// Terrain colors for the preset state roles
const BASE_PALETTE: [[u8; 4]; 6] = [
    [36, 92, 178, 255],
    [222, 204, 140, 255],
    [104, 168, 72, 255],
    [34, 100, 48, 255],
    [128, 124, 118, 255],
    [244, 246, 250, 255],
];

const UNCOLLAPSED_COLOR: [u8; 4] = [0, 0, 0, 0];

/// Deterministic color for a state
///
/// The first six states use fixed terrain colors, later ones a hashed color.
pub fn palette_color(state: StateId) -> [u8; 4] {
    if let Some(color) = BASE_PALETTE.get(state) {
        return *color;
    }
    let [r, g, b, _] = lattice_hash(state as i64, 0, 0, 0x5eed).to_le_bytes();
    [r, g, b, 255]
}

/// Inclusive world-space X/Z extent covered by loaded chunks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceBounds {
    /// Lowest world X
    pub min_x: i64,
    /// Lowest world Z
    pub min_z: i64,
    /// Width along X in cells
    pub width: u32,
    /// Depth along Z in cells
    pub depth: u32,
}

/// Compute the X/Z extent of every loaded chunk
pub fn slice_bounds(map: &ChunkMap, chunk_size: usize) -> Option<SliceBounds> {
    let size = chunk_size as i64;
    let mut extent: Option<(i64, i64, i64, i64)> = None;
    for position in map.positions() {
        let [x, _, z] = position.world_origin(chunk_size);
        extent = Some(extent.map_or((x, z, x + size, z + size), |(lx, lz, hx, hz)| {
            (lx.min(x), lz.min(z), hx.max(x + size), hz.max(z + size))
        }));
    }
    let (min_x, min_z, max_x, max_z) = extent?;
    Some(SliceBounds {
        min_x,
        min_z,
        width: u32::try_from(max_x - min_x).ok()?,
        depth: u32::try_from(max_z - min_z).ok()?,
    })
}

/// Render the collapsed states at world height `world_y` as an RGBA image
///
/// Image columns follow world X and rows follow world Z. Uncollapsed cells
/// and cells of chunks that are not loaded are transparent.
///
/// # Errors
///
/// Returns an error if no chunks are loaded or `chunk_size` is zero
pub fn render_slice(
    map: &ChunkMap,
    chunk_size: usize,
    world_y: i64,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    if chunk_size == 0 {
        return Err(invalid_parameter("chunk_size", &chunk_size, &"must be positive"));
    }
    let bounds = slice_bounds(map, chunk_size)
        .ok_or_else(|| invalid_parameter("map", &"empty", &"no chunks are loaded"))?;

    let image = ImageBuffer::from_fn(bounds.width, bounds.depth, |column, row| {
        let world = [
            bounds.min_x + i64::from(column),
            world_y,
            bounds.min_z + i64::from(row),
        ];
        let color = ChunkMap::locate(world, chunk_size)
            .and_then(|(position, local)| map.get(position)?.collapsed_state_at(local))
            .map_or(UNCOLLAPSED_COLOR, palette_color);
        Rgba(color)
    });
    Ok(image)
}

/// Render a slice and save it as PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the slice cannot be rendered, the parent directory
/// cannot be created or the image cannot be saved
pub fn export_slice_png(
    map: &ChunkMap,
    chunk_size: usize,
    world_y: i64,
    output_path: &Path,
) -> Result<()> {
    let image = render_slice(map, chunk_size, world_y)?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| GenerationError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source,
        })?;
    }

    image
        .save(output_path)
        .map_err(|source| GenerationError::ImageExport {
            path: output_path.to_path_buf(),
            source,
        })
}
