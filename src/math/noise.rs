//! Deterministic hashed value noise
//!
//! Lattice values come from a Jenkins one-at-a-time hash of the integer
//! coordinates and a seed. Smooth noise trilinearly interpolates the eight
//! surrounding lattice values with a smoothstep fade, so equal inputs always
//! produce equal outputs on every thread.

use crate::math::interpolation::{lerp, smoothstep};

/// Jenkins one-at-a-time hash of three lattice coordinates and a seed
pub fn lattice_hash(x: i64, y: i64, z: i64, seed: u64) -> u32 {
    let mut hash: u32 = 0;
    for word in [x as u64, y as u64, z as u64, seed] {
        for byte in word.to_le_bytes() {
            hash = hash.wrapping_add(u32::from(byte));
            hash = hash.wrapping_add(hash << 10);
            hash ^= hash >> 6;
        }
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

/// Lattice value in [0, 1]
pub fn lattice_value(x: i64, y: i64, z: i64, seed: u64) -> f64 {
    f64::from(lattice_hash(x, y, z, seed)) / f64::from(u32::MAX)
}

/// Smooth value noise in [0, 1] at a continuous point
pub fn smooth_noise(point: [f64; 3], seed: u64) -> f64 {
    let base = point.map(f64::floor);
    let fade = [
        smoothstep(point[0] - base[0]),
        smoothstep(point[1] - base[1]),
        smoothstep(point[2] - base[2]),
    ];
    let [x0, y0, z0] = base.map(|v| v as i64);

    let corner = |dx: i64, dy: i64, dz: i64| lattice_value(x0 + dx, y0 + dy, z0 + dz, seed);
    let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), fade[0]);
    let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), fade[0]);
    let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), fade[0]);
    let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), fade[0]);
    let y0_plane = lerp(x00, x10, fade[1]);
    let y1_plane = lerp(x01, x11, fade[1]);
    lerp(y0_plane, y1_plane, fade[2])
}

/// Smooth noise remapped to [-1, 1] and sampled at `scale` cells per lattice step
pub fn signed_noise(point: [f64; 3], scale: f64, seed: u64) -> f64 {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    smooth_noise(point.map(|v| v / scale), seed).mul_add(2.0, -1.0)
}
