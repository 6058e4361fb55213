//! One-time password generation for admin-created users and resets.

use rand::Rng;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

pub const PASSWORD_LENGTH: usize = 16;
pub const PASSWORD_DIGITS: usize = 4;
pub const PASSWORD_SYMBOLS: usize = 2;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$%^&*()_+`-={}|[]\\:\"<>?,./";

/// A generated plaintext password, handed to the caller exactly once.
///
/// `Debug` is redacted so the value cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimePassword(String);

impl OneTimePassword {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Debug for OneTimePassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OneTimePassword(<redacted>)")
    }
}

/// Generate a 16-character password with exactly 4 digits, exactly 2 symbols
/// and letters of either case for the rest. No character repeats.
pub fn generate_password() -> OneTimePassword {
    generate_with(&mut OsRng)
}

fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> OneTimePassword {
    let letters = PASSWORD_LENGTH - PASSWORD_DIGITS - PASSWORD_SYMBOLS;

    // The three alphabets are disjoint and each is sampled without
    // replacement, so the result never repeats a character.
    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LENGTH);
    chars.extend(DIGITS.choose_multiple(rng, PASSWORD_DIGITS));
    chars.extend(SYMBOLS.choose_multiple(rng, PASSWORD_SYMBOLS));
    chars.extend(LETTERS.choose_multiple(rng, letters));
    chars.shuffle(rng);

    OneTimePassword(chars.into_iter().map(char::from).collect())
}
