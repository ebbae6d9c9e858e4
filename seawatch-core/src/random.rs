//! Synthetic measurement values and the per-task random streams they draw from.

use rand::{rngs::StdRng, Rng, SeedableRng};
use seawatch_schemas::sensor::Sensor;

/// Produces a simulated water temperature for a sensor at `depth`.
///
/// A base magnitude in `1..=30` is scaled by a uniform fraction in `[0, 1)`,
/// rounded to two decimals and then multiplied by `1 + depth / 100`.
/// The arithmetic runs in single precision and is widened only on return.
pub fn generate_temperature<R: Rng + ?Sized>(rng: &mut R, depth: f64) -> f64 {
    let depth_multiplier = (1.0 + depth / 100.0) as f32;

    let base = rng.gen_range(1..=30) as f32;
    let scaled = base * rng.gen::<f32>();
    let rounded = ((f64::from(scaled) * 100.0).round() / 100.0) as f32;

    f64::from(rounded * depth_multiplier)
}

/// Largest value `generate_temperature` can return at `depth`.
pub fn max_temperature(depth: f64) -> f64 {
    f64::from(30.0_f32 * (1.0 + depth / 100.0) as f32)
}

/// Produces a transparency percentage: a base in `0..=100` plus a jitter in
/// `-5..=5`, clamped back into `0..=100`.
pub fn generate_transparency<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    let base: i32 = rng.gen_range(0..=100);
    let offset: i32 = rng.gen_range(-5..=5);

    (base + offset).clamp(0, 100) as u8
}

/// Hands out one independent random stream per emission task.
///
/// Every task owns the `StdRng` it receives, so no generator state is shared
/// between tasks and no locking is needed around individual draws.
pub trait RngProvider: Send + Sync {
    fn rng_for(&self, sensor: &Sensor) -> StdRng;
}

/// Seeds every stream from operating system entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropyRng;

impl RngProvider for EntropyRng {
    fn rng_for(&self, _sensor: &Sensor) -> StdRng {
        StdRng::from_entropy()
    }
}

/// Derives a reproducible stream per sensor from a base seed.
#[derive(Debug, Clone, Copy)]
pub struct SeededRng(pub u64);

impl RngProvider for SeededRng {
    fn rng_for(&self, sensor: &Sensor) -> StdRng {
        StdRng::seed_from_u64(self.0 ^ sensor.id.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}
