//! Resource id rolling
//!
//! Ids are 6 random alphanumeric characters. A candidate is re-rolled until it
//! is absent from the resource index, so id values carry no ordering.

use uuid::Uuid;

pub const ID_LEN: usize = 6;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Version and variant bytes of a v4 uuid carry fixed bits
const FIXED_BYTES: [usize; 2] = [6, 8];

/// Largest multiple of the alphabet size that fits in a byte
const BYTE_LIMIT: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Draw one candidate id from the v4 uuid random source
///
/// Bytes at or above [`BYTE_LIMIT`] are skipped so every character is
/// equally likely.
pub fn sample_id() -> String {
    let mut id = String::with_capacity(ID_LEN);
    while id.len() < ID_LEN {
        let uuid = Uuid::new_v4();
        let random = uuid
            .as_bytes()
            .iter()
            .enumerate()
            .filter(|(i, _)| !FIXED_BYTES.contains(i))
            .map(|(_, b)| *b);
        for b in random {
            if id.len() == ID_LEN {
                break;
            }
            if b < BYTE_LIMIT {
                id.push(char_for(b));
            }
        }
    }
    id
}

fn char_for(byte: u8) -> char {
    ALPHABET[byte as usize % ALPHABET.len()] as char
}

/// Roll an id that is not in `taken`
pub fn roll_id(taken: &[String]) -> String {
    roll_id_with(taken, sample_id)
}

/// Rejection sampling over an arbitrary candidate source
pub fn roll_id_with(taken: &[String], mut sample: impl FnMut() -> String) -> String {
    loop {
        let candidate = sample();
        if !taken.contains(&candidate) {
            return candidate;
        }
        log::debug!("Id {} already taken, rolling again", candidate);
    }
}
