// src/utils/join_code.rs

use rand::Rng;

/// 32-symbol alphabet for join codes. Excludes the visually ambiguous
/// 0/O and 1/I so codes survive being read off a projector or shouted
/// across a classroom.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

/// Generates a random join code.
///
/// 32^6 ≈ 1.07 billion combinations, which keeps the collision
/// probability negligible for realistic concurrent session counts.
/// Uniqueness among live sessions is still enforced at insert time.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
