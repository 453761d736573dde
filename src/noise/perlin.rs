//! Gradient (Perlin) noise for smooth path deviation
//!
//! Low-frequency, continuous offsets that bend a planned curve slightly
//! differently on every movement.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::geometry::Vec2;

/// Seeded 1D gradient noise
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    /// Build a permutation table shuffled by `seed`
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        for (i, &v) in table.iter().enumerate() {
            perm[i] = v;
            perm[i + 256] = v;
        }
        Self { perm }
    }

    /// Smooth noise value within `[-0.5, 0.5]`
    pub fn noise1d(&self, x: f64) -> f64 {
        let floor = x.floor();
        let xi = (floor as i64 & 255) as usize;
        let xf = x - floor;
        let u = fade(xf);

        let a = self.perm[xi];
        let b = self.perm[xi + 1];
        lerp(u, grad1d(a, xf), grad1d(b, xf - 1.0))
    }

    /// Offset from the ideal path at `progress` for the movement keyed by `seed`.
    /// X and Y use different frequencies to avoid a diagonal bias.
    pub fn path_offset(&self, progress: f64, amplitude: f64, seed: u64) -> Vec2 {
        let freq_x = 3.0 + unit_hash(seed) * 2.5;
        let freq_y = 3.5 + unit_hash(seed ^ 0xDEAD_BEEF) * 2.5;

        // Keep the phase term small so noise1d's lattice index stays well-defined
        let phase = (seed % 100_000) as f64;
        let x = self.noise1d((progress * 10.0 + phase * 0.001) * freq_x) * amplitude;
        let y = self.noise1d((progress * 10.0 + phase * 0.002 + 100.0) * freq_y) * amplitude;
        Vec2::new(x, y)
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad1d(hash: u8, x: f64) -> f64 {
    if hash & 1 == 0 {
        x
    } else {
        -x
    }
}

/// Murmur3 finalizer mapped to `[0, 1)`
fn unit_hash(seed: u64) -> f64 {
    let mut h = seed;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    (h >> 11) as f64 / (1u64 << 53) as f64
}
