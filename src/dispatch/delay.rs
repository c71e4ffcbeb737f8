//! Delivery delay sources.
//!
//! Every delivery adds one delay term to its distance. The engine only sees the
//! [`DelaySource`] trait, so tests pin the delay while the CLI and server draw
//! it from a seeded SplitMix64 stream.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

/// Lower bound (inclusive) of a randomized delivery delay.
pub const DELAY_MIN: f64 = 1.0;
/// Upper bound (exclusive) of a randomized delivery delay.
pub const DELAY_MAX: f64 = 5.0;

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// Supplies the delay added to each delivery, in distance units.
pub trait DelaySource {
    fn next_delay(&mut self) -> f64;
}

impl<D: DelaySource + ?Sized> DelaySource for &mut D {
    fn next_delay(&mut self) -> f64 {
        (**self).next_delay()
    }
}

/// No delay at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelaySource for NoDelay {
    fn next_delay(&mut self) -> f64 {
        0.0
    }
}

/// The same delay for every delivery.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub f64);

impl DelaySource for FixedDelay {
    fn next_delay(&mut self) -> f64 {
        self.0
    }
}

/// Uniform delay in `[DELAY_MIN, DELAY_MAX)`. Same seed, same sequence.
#[derive(Debug, Clone, Copy)]
pub struct UniformDelay {
    seed: u64,
    state: u64,
}

impl UniformDelay {
    pub fn from_seed(seed: u64) -> Self {
        Self { seed, state: seed }
    }

    /// Seeds from the OS entropy source, falling back to the wall clock.
    pub fn from_entropy() -> Self {
        let mut buf = [0_u8; 8];
        let seed = match getrandom::fill(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(err) => {
                warn!(error = %err, "os entropy unavailable, seeding delay from clock");
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_nanos() as u64)
                    .unwrap_or(SPLITMIX64_GOLDEN)
            }
        };
        Self::from_seed(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Top 53 bits as a fraction in `[0, 1)`.
    #[inline]
    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl DelaySource for UniformDelay {
    fn next_delay(&mut self) -> f64 {
        DELAY_MIN + (DELAY_MAX - DELAY_MIN) * self.next_unit()
    }
}
