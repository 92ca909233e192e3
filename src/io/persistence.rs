//! Line-oriented chunk persistence
//!
//! A chunk is written as a header line `CHUNK:<x>,<y>,<z>:<size>` followed by
//! one `C:<x>,<y>,<z>:<state>` line per collapsed cell. Uncollapsed cells are
//! not written, so loading restores only the collapse decisions.

use crate::algorithm::bitset::StateSet;
use crate::io::configuration::{CHUNK_FILE_EXTENSION, MAX_CHUNK_SIZE};
use crate::io::error::{GenerationError, Result, parse_error};
use crate::spatial::chunk::{Chunk, ChunkPosition};
use std::path::{Path, PathBuf};

const HEADER_TAG: &str = "CHUNK";
const CELL_TAG: &str = "C";

/// Render a chunk's collapsed cells in row-major order
pub fn serialize_chunk(chunk: &Chunk) -> String {
    let position = chunk.position();
    let mut text = format!(
        "{HEADER_TAG}:{},{},{}:{}\n",
        position.x,
        position.y,
        position.z,
        chunk.size()
    );
    for ([x, y, z], state) in chunk.collapsed_cells() {
        text.push_str(&format!("{CELL_TAG}:{x},{y},{z}:{state}\n"));
    }
    text
}

/// Rebuild a chunk by replaying every persisted collapse
///
/// The chunk is initialized with all `state_count` states before the
/// collapses are applied. Blank lines are skipped.
///
/// # Errors
///
/// Returns a parse error naming the line for a missing or malformed header,
/// a malformed cell record, an out-of-range cell coordinate or a cell listed
/// twice with different states, and an invalid state error for a state id at
/// or above `state_count`.
pub fn deserialize_chunk(text: &str, state_count: usize) -> Result<Chunk> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| parse_error(1, &"missing chunk header"))?;
    let (position, size) = parse_header(header_line, header)?;

    let mut chunk = Chunk::new(position, size, state_count);
    chunk.initialize_cells(&StateSet::all(state_count));

    for (line_number, line) in lines {
        let (cell, state) = parse_cell(line_number, line)?;
        if cell.iter().any(|&axis| axis >= size) {
            return Err(parse_error(
                line_number,
                &format!("cell {cell:?} lies outside a chunk of size {size}"),
            ));
        }
        if state >= state_count {
            return Err(GenerationError::InvalidState { state, state_count });
        }
        let replayed = chunk.cell_mut(cell).is_some_and(|target| {
            target.collapsed_state() == Some(state) || target.collapse(state)
        });
        if !replayed {
            return Err(parse_error(
                line_number,
                &format!("cell {cell:?} cannot collapse to state {state}"),
            ));
        }
    }

    chunk.set_fully_collapsed(chunk.all_cells_collapsed());
    chunk.clear_dirty();
    Ok(chunk)
}

fn parse_header(line_number: usize, line: &str) -> Result<(ChunkPosition, usize)> {
    let mut fields = line.split(':');
    if fields.next() != Some(HEADER_TAG) {
        return Err(parse_error(line_number, &"expected a CHUNK header"));
    }
    let coordinates = fields
        .next()
        .ok_or_else(|| parse_error(line_number, &"missing chunk coordinates"))?;
    let [x, y, z] = parse_triple::<i32>(line_number, coordinates)?;
    let size = fields
        .next()
        .and_then(|field| field.parse::<usize>().ok())
        .ok_or_else(|| parse_error(line_number, &"missing or invalid chunk size"))?;
    if fields.next().is_some() {
        return Err(parse_error(line_number, &"trailing fields after chunk size"));
    }
    if size == 0 || size > MAX_CHUNK_SIZE {
        return Err(parse_error(
            line_number,
            &format!("chunk size {size} must be between 1 and {MAX_CHUNK_SIZE}"),
        ));
    }
    Ok((ChunkPosition::new(x, y, z), size))
}

fn parse_cell(line_number: usize, line: &str) -> Result<([usize; 3], usize)> {
    let mut fields = line.split(':');
    if fields.next() != Some(CELL_TAG) {
        return Err(parse_error(line_number, &"expected a C cell record"));
    }
    let coordinates = fields
        .next()
        .ok_or_else(|| parse_error(line_number, &"missing cell coordinates"))?;
    let cell = parse_triple::<usize>(line_number, coordinates)?;
    let state = fields
        .next()
        .and_then(|field| field.parse::<usize>().ok())
        .ok_or_else(|| parse_error(line_number, &"missing or invalid state"))?;
    if fields.next().is_some() {
        return Err(parse_error(line_number, &"trailing fields after state"));
    }
    Ok((cell, state))
}

fn parse_triple<T: std::str::FromStr>(line_number: usize, field: &str) -> Result<[T; 3]> {
    let mut parts = field.split(',').map(|part| part.trim().parse::<T>().ok());
    let triple = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Some(a)), Some(Some(b)), Some(Some(c)), None) => Some([a, b, c]),
        _ => None,
    };
    triple.ok_or_else(|| parse_error(line_number, &format!("invalid coordinates '{field}'")))
}

/// File name used for a chunk inside an output directory
pub fn chunk_file_name(position: ChunkPosition) -> String {
    format!(
        "chunk_{}_{}_{}.{CHUNK_FILE_EXTENSION}",
        position.x, position.y, position.z
    )
}

/// Write a chunk into `directory`, creating the directory if needed
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns a file system error if the directory or file cannot be written
pub fn save_chunk(chunk: &Chunk, directory: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(directory).map_err(|source| GenerationError::FileSystem {
        path: directory.to_path_buf(),
        operation: "create directory",
        source,
    })?;
    let path = directory.join(chunk_file_name(chunk.position()));
    std::fs::write(&path, serialize_chunk(chunk)).map_err(|source| {
        GenerationError::FileSystem {
            path: path.clone(),
            operation: "write chunk",
            source,
        }
    })?;
    Ok(path)
}

/// Read and rebuild a chunk file
///
/// # Errors
///
/// Returns a file system error if the file cannot be read, or any error of
/// [`deserialize_chunk`]
pub fn load_chunk(path: &Path, state_count: usize) -> Result<Chunk> {
    let text = std::fs::read_to_string(path).map_err(|source| GenerationError::FileSystem {
        path: path.to_path_buf(),
        operation: "read chunk",
        source,
    })?;
    deserialize_chunk(&text, state_count)
}
