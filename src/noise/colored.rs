//! Pink (1/f) noise source
//!
//! Voss-McCartney generator: a bank of uniform octaves where octave `i`
//! is refreshed every `2^i` samples. The running sum has a power spectrum
//! falling off at roughly -10 dB per decade.

use rand::Rng;

/// Default number of octaves
pub const DEFAULT_OCTAVES: usize = 16;

/// Fewer octaves than this no longer cover the low end of the movement band
pub const MIN_OCTAVES: usize = 12;

/// Upper bound for the octave bank (the step counter is 64-bit)
const MAX_OCTAVES: usize = 32;

/// Scalar colored-noise sequence bounded to `[-1, 1]`
#[derive(Debug, Clone)]
pub struct ColoredNoise {
    octaves: [f64; MAX_OCTAVES],
    count: usize,
    scale: f64,
    sum: f64,
    step: u64,
    primed: bool,
}

impl Default for ColoredNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl ColoredNoise {
    pub fn new() -> Self {
        Self::with_octaves(DEFAULT_OCTAVES)
    }

    /// Create a source with `octaves` octaves, clamped into `[12, 32]`
    pub fn with_octaves(octaves: usize) -> Self {
        let count = octaves.clamp(MIN_OCTAVES, MAX_OCTAVES);
        Self {
            octaves: [0.0; MAX_OCTAVES],
            count,
            scale: 1.0 / (count as f64).sqrt(),
            sum: 0.0,
            step: 0,
            primed: false,
        }
    }

    pub fn octave_count(&self) -> usize {
        self.count
    }

    /// Samples produced since construction or the last reset
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Next sample in `[-1, 1]`
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        if !self.primed {
            self.prime(rng);
        }

        self.refresh(0, rng);

        self.step = self.step.wrapping_add(1);
        // Octave i >= 1 fires every 2^i samples
        let octave = 1 + self.step.trailing_zeros() as usize;
        if octave < self.count {
            self.refresh(octave, rng);
        }

        (self.sum * self.scale).clamp(-1.0, 1.0)
    }

    /// Forget all octave state; the bank is refilled on the next sample
    pub fn reset(&mut self) {
        self.octaves = [0.0; MAX_OCTAVES];
        self.sum = 0.0;
        self.step = 0;
        self.primed = false;
    }

    fn prime<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.sum = 0.0;
        for i in 0..self.count {
            let value = rng.random_range(-self.scale..=self.scale);
            self.octaves[i] = value;
            self.sum += value;
        }
        self.primed = true;
    }

    fn refresh<R: Rng + ?Sized>(&mut self, octave: usize, rng: &mut R) {
        let value = rng.random_range(-self.scale..=self.scale);
        self.sum += value - self.octaves[octave];
        self.octaves[octave] = value;
    }
}
