//! Participant credential generation.
//!
//! Logins and passwords are random but human-pronounceable: the generator
//! alternates consonants and vowels, so a participant can read their login
//! out loud at the venue. Credentials are assigned exactly once; a record
//! that already carries them is never touched.

use rand::Rng;

use crate::core::config;
use crate::storage::types::ContestParticipant;

const VOWELS: [char; 5] = ['e', 'u', 'i', 'o', 'a'];
const CONSONANTS: [char; 15] = [
    'q', 'r', 't', 'p', 's', 'd', 'g', 'h', 'k', 'z', 'x', 'v', 'b', 'n', 'm',
];

/// Builds a pronounceable random string of exactly `length` characters:
/// a consonant at every even position, a vowel at every odd one. For odd
/// lengths the trailing vowel is skipped so the requested length is met.
pub fn pronounceable(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(length);

    for i in (0..length).step_by(2) {
        out.push(CONSONANTS[rng.gen_range(0..CONSONANTS.len())]);
        if i + 1 < length {
            out.push(VOWELS[rng.gen_range(0..VOWELS.len())]);
        }
    }

    out
}

/// Generates a fresh login: fixed prefix plus a pronounceable suffix.
pub fn generate_login() -> String {
    format!(
        "{}{}",
        config::credentials::LOGIN_PREFIX,
        pronounceable(config::credentials::LOGIN_SUFFIX_CHARS)
    )
}

/// Generates a fresh password.
pub fn generate_password() -> String {
    pronounceable(config::credentials::PASSWORD_CHARS)
}

/// Fills in login/password on a participant record, but only where blank.
/// Repeated saves of the same record keep the credentials byte-for-byte.
pub fn ensure_credentials(participant: &mut ContestParticipant) {
    if participant.login.is_empty() {
        participant.login = generate_login();
    }
    if participant.password.is_empty() {
        participant.password = generate_password();
    }
}
