//! Pseudo-random resource names.
//!
//! Generated names seed throwaway records (user accounts, passwords,
//! contact emails) when populating a cache by hand or from the CLI `seed`
//! command. Nothing here is cryptographic.

use rand::Rng;

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Default length of the random part of a name.
const NAME_LEN: usize = 16;

fn sample(length: usize, alphabet: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Generate a pseudo-random name of `length` alphanumeric characters after
/// `prefix`.
pub fn random_name(prefix: &str, length: usize) -> String {
    format!("{prefix}{}", sample(length, ALNUM))
}

/// Generate a pseudo-random password.
pub fn random_password() -> String {
    random_name("", NAME_LEN)
}

/// Generate a pseudo-random `xxx@yyy.zzz` email address.
pub fn random_email() -> String {
    format!(
        "{}@{}.{}",
        sample(3, LOWER),
        sample(3, LOWER),
        sample(3, LOWER)
    )
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_has_prefix_and_length() {
        let name = random_name("vol-", 16);
        assert!(name.starts_with("vol-"));
        assert_eq!(name.len(), 4 + 16);
        assert!(name[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn password_is_sixteen_alphanumerics() {
        let password = random_password();
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn email_has_three_lowercase_parts() {
        let email = random_email();
        let rest = email.replace(['@', '.'], "");
        assert_eq!(email.len(), 11);
        assert_eq!(email.matches('@').count(), 1);
        assert_eq!(email.matches('.').count(), 1);
        assert!(rest.chars().all(|c| c.is_ascii_lowercase()));
    }
}
