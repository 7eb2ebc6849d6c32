//! Deterministic pixel data for the built-in noise texture.
//!
//! Packs sample `noisetex` for dithering and jitter. The texture content is
//! derived from a fixed-seed xorshift64 generator so that a given
//! resolution always uploads identical bytes.

/// Resolution used when a pack does not set `noise_texture_resolution`.
pub const DEFAULT_NOISE_RESOLUTION: u32 = 256;

const NOISE_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

/// Xorshift64 PRNG with shifts (13, 7, 17).
///
/// A zero seed is replaced with a non-zero fallback, since zero is a fixed
/// point of the algorithm.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { NOISE_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

/// RGBA8 bytes for a `resolution` x `resolution` noise texture.
///
/// Each pixel takes four bytes from one generator step.
pub fn noise_pixels(resolution: u32) -> Vec<u8> {
    let pixels = resolution as usize * resolution as usize;
    let mut rng = Xorshift64::new(NOISE_SEED);
    (0..pixels)
        .flat_map(|_| {
            let bits = rng.next_u64();
            [
                (bits >> 56) as u8,
                (bits >> 48) as u8,
                (bits >> 40) as u8,
                (bits >> 32) as u8,
            ]
        })
        .collect()
}
