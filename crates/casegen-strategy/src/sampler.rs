//! Seeded, lazy iteration over a case strategy

use proptest::strategy::{BoxedStrategy, Strategy, ValueTree};
use proptest::test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner};

use casegen_core::Case;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("failed to draw a case: {0}")]
    Draw(String),
}

/// Draws cases one at a time from a strategy. The same seed replays the same sequence.
pub struct CaseSampler {
    strategy: BoxedStrategy<Case>,
    runner: TestRunner,
    seed: u64,
}

impl CaseSampler {
    /// `None` picks a random seed; read it back with [`CaseSampler::seed`] to replay.
    #[must_use]
    pub fn new(strategy: BoxedStrategy<Case>, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            strategy,
            runner: runner_for(seed),
            seed,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw one fresh case.
    ///
    /// # Errors
    ///
    /// Returns error if the strategy rejects too many candidates
    /// (e.g. a `pattern` that never meets its length bounds).
    pub fn draw(&mut self) -> Result<Case, SampleError> {
        self.strategy
            .new_tree(&mut self.runner)
            .map(|tree| tree.current())
            .map_err(|reason| SampleError::Draw(reason.to_string()))
    }
}

impl Iterator for CaseSampler {
    type Item = Result<Case, SampleError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.draw())
    }
}

/// ChaCha-backed runner so a sequence depends on the seed alone.
fn runner_for(seed: u64) -> TestRunner {
    let config = ProptestConfig {
        rng_algorithm: RngAlgorithm::ChaCha,
        ..ProptestConfig::default()
    };
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &chacha_seed(seed));
    TestRunner::new_with_rng(config, rng)
}

/// Expand a `u64` into the 32-byte ChaCha key: the seed itself, then three
/// lanes stepped by the golden ratio and rotated.
fn chacha_seed(seed: u64) -> [u8; 32] {
    const STEP: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut key = [0_u8; 32];
    let mut lane = seed;
    for chunk in key.chunks_exact_mut(8) {
        chunk.copy_from_slice(&lane.to_le_bytes());
        lane = lane.wrapping_add(STEP).rotate_left(17);
    }
    key
}
