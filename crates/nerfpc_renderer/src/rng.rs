//! Deterministic seed splitting for per-device random streams.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Derive `n` independent substream seeds from one base seed.
///
/// The split is a pure function of `(seed, n)`: identical inputs always
/// yield identical substreams, and every position gets a distinct stream.
/// Uses the splitmix64 mixing function.
pub fn split(seed: u64, n: usize) -> Vec<u64> {
    let mut state = seed;
    (0..n).map(|_| splitmix64(&mut state)).collect()
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The pair of random streams handed to one device for one frame.
///
/// The coarse and fine streams feed the scene model's two sampling
/// stages. Deterministic models are free to ignore them.
#[derive(Debug)]
pub struct DeviceRng {
    pub coarse: StdRng,
    pub fine: StdRng,
}

impl DeviceRng {
    /// Build the stream pair from two substream seeds.
    pub fn from_seeds(coarse: u64, fine: u64) -> Self {
        Self {
            coarse: StdRng::seed_from_u64(coarse),
            fine: StdRng::seed_from_u64(fine),
        }
    }
}
