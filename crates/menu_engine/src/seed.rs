//! Per-restaurant seeding.
//!
//! Every generator is constructed locally from the restaurant identity; there
//! is no shared RNG. The seed is SHA-256 of the UTF-8 identity, fed to
//! ChaCha8, whose output is portable across platforms and processes. Menu and
//! delivery draw from distinct ChaCha streams of the same seed, so the two
//! never consume each other's randomness.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Stream index within a restaurant's seed family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStream {
    Menu,
    Delivery,
}

impl SeedStream {
    fn index(self) -> u64 {
        match self {
            SeedStream::Menu => 0,
            SeedStream::Delivery => 1,
        }
    }
}

/// 32-byte seed derived from the restaurant identity.
pub fn seed_for(restaurant_id: &str) -> [u8; 32] {
    let digest = Sha256::digest(restaurant_id.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// Fresh generator for one restaurant and one stream.
pub fn stream_rng(restaurant_id: &str, stream: SeedStream) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::from_seed(seed_for(restaurant_id));
    rng.set_stream(stream.index());
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_seed_is_sha256_of_identity() {
        // sha256("r-100"), pinned so the seed family is stable across builds.
        let expected = "477d3fe25d4cf0fff64d45a99fbe616b6949092c2ed222f2f8a51ada67529b10";
        let hex: String = seed_for("r-100").iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(hex, expected);
    }

    #[test]
    fn test_same_identity_same_stream() {
        let mut a = stream_rng("r-100", SeedStream::Menu);
        let mut b = stream_rng("r-100", SeedStream::Menu);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_streams_do_not_collide() {
        let mut menu = stream_rng("r-100", SeedStream::Menu);
        let mut delivery = stream_rng("r-100", SeedStream::Delivery);
        let menu_draws: Vec<u64> = (0..8).map(|_| menu.next_u64()).collect();
        let delivery_draws: Vec<u64> = (0..8).map(|_| delivery.next_u64()).collect();
        assert_ne!(menu_draws, delivery_draws);
    }

    #[test]
    fn test_distinct_identities_diverge() {
        let mut a = stream_rng("r-100", SeedStream::Menu);
        let mut b = stream_rng("r-101", SeedStream::Menu);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
