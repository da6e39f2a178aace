use rand::Rng;

pub const JOIN_CODE_LENGTH: usize = 8;

const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on insert attempts when a freshly generated code collides
/// with an existing one.
pub const MAX_GENERATION_ATTEMPTS: usize = 16;

/// Generates a random 8-character code of uppercase letters and digits.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
            char::from(JOIN_CODE_ALPHABET[idx])
        })
        .collect()
}

/// Trims and upper-cases user input so lookups are case-insensitive.
pub fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == JOIN_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
