//! Injectable randomness. The engine never calls `rand::thread_rng()`
//! directly so that tests can seed a deterministic source.
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Build the RNG a fresh `Game` should use. In test mode every game gets
/// the same seed so combat/travel/economy rolls are reproducible; in
/// normal operation each game gets an entropy-seeded RNG.
#[must_use]
pub fn new_rng(test_mode: bool) -> SmallRng {
  if test_mode {
    SmallRng::seed_from_u64(0)
  } else {
    SmallRng::from_entropy()
  }
}

/// Sample a uniform `f64` in `[lo, hi)`.
pub fn uniform(rng: &mut impl rand::RngCore, lo: f64, hi: f64) -> f64 {
  use rand::Rng;
  rng.gen_range(lo..hi)
}

/// Sample a uniform integer in `[lo, hi]` inclusive.
pub fn uniform_int(rng: &mut impl rand::RngCore, lo: i64, hi: i64) -> i64 {
  use rand::Rng;
  rng.gen_range(lo..=hi)
}

/// `true` with probability `p` (clamped to `[0,1]`).
pub fn chance(rng: &mut impl rand::RngCore, p: f64) -> bool {
  use rand::Rng;
  rng.gen::<f64>() < p.clamp(0.0, 1.0)
}
