use argon2rs::{verifier::Encoded, Argon2, Variant};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::ServiceError;

/// Generate a random 32-byte salt value.
fn random_salt(rng: &SystemRandom) -> Result<[u8; 32], ServiceError> {
    let mut salt = [0; 32];
    rng.fill(&mut salt)
        .map_err(|_| ServiceError::Internal("failed to generate salt".to_string()))?;
    Ok(salt)
}

fn argon2_session(salt: &[u8], password: &str) -> Encoded {
    Encoded::new(
        Argon2::default(Variant::Argon2i),
        password.as_bytes(),
        salt,
        b"",
        b"",
    )
}

/// A salted argon2 digest in its self-describing encoded form.
///
/// The encoded bytes embed the salt and parameters, so a single `BYTEA`
/// column is enough to verify later logins.
pub struct PasswordHash(Vec<u8>);

impl PasswordHash {
    /// Generate a random salt, then hash the password under it.
    pub fn from_password(rng: &SystemRandom, password: &str) -> Result<PasswordHash, ServiceError> {
        let salt = random_salt(rng)?;
        Ok(PasswordHash(argon2_session(&salt, password).to_u8()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> PasswordHash {
        PasswordHash(bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Constant-time verification against the stored digest. Undecodable
    /// stored bytes count as a mismatch rather than an error.
    pub fn verify(&self, password: &str) -> bool {
        match Encoded::from_u8(&self.0) {
            Ok(encoded) => encoded.verify(password.as_bytes()),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_verify() {
        let rng = SystemRandom::new();
        let password = "some_other_password";
        let hash = PasswordHash::from_password(&rng, password).unwrap();
        assert_eq!(hash.verify(password), true);
    }

    #[test]
    fn test_verify_wrong_password() {
        let rng = SystemRandom::new();
        let hash = PasswordHash::from_password(&rng, "correct horse").unwrap();
        assert_eq!(hash.verify("battery staple"), false);
    }

    #[test]
    fn test_verify_survives_storage_round_trip() {
        let rng = SystemRandom::new();
        let password = "password123";
        let stored = PasswordHash::from_password(&rng, password).unwrap().into_bytes();
        let hash = PasswordHash::from_bytes(stored);
        assert!(hash.verify(password));
    }

    #[test]
    fn test_garbage_bytes_never_verify() {
        let hash = PasswordHash::from_bytes(b"not an encoded digest".to_vec());
        assert!(!hash.verify("anything"));
    }
}
