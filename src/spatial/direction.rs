//! Six face directions of the cubic lattice
//!
//! Each direction names a chunk face. Opposite faces share the same 2-D
//! parameterization, so face index `i` on one chunk's East face and face index
//! `i` on its eastern neighbor's West face address touching cells.

use std::fmt;

/// Axis-aligned face direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Positive Y
    Up,
    /// Negative Y
    Down,
    /// Positive Z
    North,
    /// Negative Z
    South,
    /// Positive X
    East,
    /// Negative X
    West,
}

impl Direction {
    /// All directions in table order
    pub const ALL: [Self; 6] = [
        Self::Up,
        Self::Down,
        Self::North,
        Self::South,
        Self::East,
        Self::West,
    ];

    /// Number of directions
    pub const COUNT: usize = 6;

    /// Stable index used by the adjacency table
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::North => 2,
            Self::South => 3,
            Self::East => 4,
            Self::West => 5,
        }
    }

    /// Direction from its table index
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Up),
            1 => Some(Self::Down),
            2 => Some(Self::North),
            3 => Some(Self::South),
            4 => Some(Self::East),
            5 => Some(Self::West),
            _ => None,
        }
    }

    /// The facing direction
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Unit lattice offset as (x, y, z)
    pub const fn offset(self) -> [i32; 3] {
        match self {
            Self::Up => [0, 1, 0],
            Self::Down => [0, -1, 0],
            Self::North => [0, 0, 1],
            Self::South => [0, 0, -1],
            Self::East => [1, 0, 0],
            Self::West => [-1, 0, 0],
        }
    }

    /// Axis this direction moves along (0 = x, 1 = y, 2 = z)
    pub const fn axis(self) -> usize {
        match self {
            Self::East | Self::West => 0,
            Self::Up | Self::Down => 1,
            Self::North | Self::South => 2,
        }
    }

    /// Whether this direction points toward increasing coordinates
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Up | Self::North | Self::East)
    }

    /// Step a chunk-local position one cell in this direction
    ///
    /// Returns `None` when the step leaves a chunk of the given size.
    pub fn step(self, position: [usize; 3], size: usize) -> Option<[usize; 3]> {
        let offset = self.offset();
        let mut next = [0usize; 3];
        for axis in 0..3 {
            let coord = position.get(axis).copied()? as i64 + offset.get(axis).copied()? as i64;
            if coord < 0 || coord >= size as i64 {
                return None;
            }
            if let Some(slot) = next.get_mut(axis) {
                *slot = coord as usize;
            }
        }
        Some(next)
    }

    /// Whether the local position lies on this face of a chunk
    pub fn is_on_face(self, position: [usize; 3], size: usize) -> bool {
        let coord = position.get(self.axis()).copied().unwrap_or(usize::MAX);
        if self.is_positive() {
            size > 0 && coord == size - 1
        } else {
            coord == 0
        }
    }

    /// The two in-face axes (u, v) used by the face parameterization
    const fn face_axes(self) -> (usize, usize) {
        match self.axis() {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        }
    }

    /// Face index of a local position on this face
    ///
    /// Returns `None` if the position is not on the face.
    pub fn face_index(self, position: [usize; 3], size: usize) -> Option<usize> {
        if !self.is_on_face(position, size) {
            return None;
        }
        let (u_axis, v_axis) = self.face_axes();
        let u = position.get(u_axis).copied()?;
        let v = position.get(v_axis).copied()?;
        Some(u * size + v)
    }

    /// Local position of the cell at a face index
    pub fn face_cell(self, index: usize, size: usize) -> Option<[usize; 3]> {
        if size == 0 || index >= size * size {
            return None;
        }
        let (u_axis, v_axis) = self.face_axes();
        let mut position = [0usize; 3];
        if let Some(slot) = position.get_mut(self.axis()) {
            *slot = if self.is_positive() { size - 1 } else { 0 };
        }
        if let Some(slot) = position.get_mut(u_axis) {
            *slot = index / size;
        }
        if let Some(slot) = position.get_mut(v_axis) {
            *slot = index % size;
        }
        Some(position)
    }

    /// All local positions on this face in face-index order
    pub fn face_cells(self, size: usize) -> Vec<[usize; 3]> {
        (0..size * size)
            .filter_map(|index| self.face_cell(index, size))
            .collect()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        };
        f.write_str(name)
    }
}
