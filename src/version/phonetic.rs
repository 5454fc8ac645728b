//! Pronounceable build names.
//!
//! `build.rs` includes this file directly, so it must not depend on anything outside `std`.

/// Builds closer together than this share a name.
pub const BUILD_INTERVAL_SECS: u64 = 180;

const CONSONANTS: [char; 20] = [
    'b', 'c', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'm', 'n', 'p', 'r', 's', 't', 'v', 'w', 'x', 'y',
    'z',
];

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Pronounceable name for a Unix timestamp (seconds).
///
/// The timestamp is bucketed by [`BUILD_INTERVAL_SECS`], written in base 20 with consonants as
/// digits (most significant first), and each consonant is followed by a vowel cycling with its
/// position.
pub fn phonetic_name(timestamp_secs: u64) -> String {
    let mut bucket = timestamp_secs / BUILD_INTERVAL_SECS;
    let mut digits = Vec::new();
    loop {
        digits.push(CONSONANTS[(bucket % 20) as usize]);
        bucket /= 20;
        if bucket == 0 {
            break;
        }
    }
    digits.reverse();

    digits
        .iter()
        .enumerate()
        .flat_map(|(i, consonant)| [*consonant, VOWELS[i % VOWELS.len()]])
        .collect()
}
