//! Random sources and the per-call seed override.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The random source of a sampler: a long-lived generator, or a seeded
/// ChaCha stream installed for one reproducible call.
#[derive(Debug, Clone)]
pub enum SamplerRng {
    Std(StdRng),
    Seeded(ChaCha8Rng),
}

impl SamplerRng {
    /// Generator seeded from the OS, or from `seed` when given.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => SamplerRng::Std(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        SamplerRng::Seeded(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RngCore for SamplerRng {
    fn next_u32(&mut self) -> u32 {
        match self {
            SamplerRng::Std(rng) => rng.next_u32(),
            SamplerRng::Seeded(rng) => rng.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match self {
            SamplerRng::Std(rng) => rng.next_u64(),
            SamplerRng::Seeded(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        match self {
            SamplerRng::Std(rng) => rng.fill_bytes(dst),
            SamplerRng::Seeded(rng) => rng.fill_bytes(dst),
        }
    }
}

/// Installs a seeded generator for the lifetime of the guard and puts the
/// previous one back on drop. Without a seed the slot is used as is.
///
/// # Example
///
/// ```
/// use rand::Rng;
/// use regionfit_sampler::{RngScope, SamplerRng};
///
/// let mut slot = SamplerRng::seeded(1);
/// let untouched: u64 = slot.clone().random();
///
/// let first: u64 = RngScope::new(&mut slot, Some(7)).rng().random();
/// let second: u64 = RngScope::new(&mut slot, Some(7)).rng().random();
/// assert_eq!(first, second);
///
/// // the outer stream did not advance
/// assert_eq!(slot.random::<u64>(), untouched);
/// ```
#[derive(Debug)]
pub struct RngScope<'a> {
    slot: &'a mut SamplerRng,
    saved: Option<SamplerRng>,
}

impl<'a> RngScope<'a> {
    pub fn new(slot: &'a mut SamplerRng, seed: Option<u64>) -> Self {
        let saved = seed.map(|seed| std::mem::replace(slot, SamplerRng::seeded(seed)));
        Self { slot, saved }
    }

    pub fn rng(&mut self) -> &mut SamplerRng {
        self.slot
    }
}

impl Drop for RngScope<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.saved.take() {
            *self.slot = previous;
        }
    }
}
