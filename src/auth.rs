use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::config::PasswordSource;

/// The single administrator account. Only the argon2 hash is kept in memory.
#[derive(Clone, Debug)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl AdminCredentials {
    pub fn new(
        username: String,
        password: &PasswordSource,
    ) -> Result<Self, argon2::password_hash::Error> {
        let password_hash = match password {
            PasswordSource::Hash(hash) => {
                // Reject malformed PHC strings at startup rather than on first login.
                PasswordHash::new(hash)?;
                hash.clone()
            }
            PasswordSource::Plain(plain) => {
                let pw_salt = SaltString::generate(OsRng);
                Argon2::default()
                    .hash_password(plain.as_bytes(), &pw_salt)?
                    .to_string()
            }
        };

        Ok(Self {
            username,
            password_hash,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Ok(db_hash) = PasswordHash::new(&self.password_hash) else {
            return false;
        };

        // Always run the hash check so a wrong username costs the same as a wrong password.
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &db_hash)
            .is_ok();

        password_ok && username == self.username
    }
}
