use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

/// Hash stored on the `profiles` row of a freshly created staff login.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn hash_verifies_against_original_password() {
        let hashed = hash_password("balance-beam").unwrap();
        let parsed = PasswordHash::new(&hashed).unwrap();

        assert!(Argon2::default().verify_password(b"balance-beam", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"vault", &parsed).is_err());
    }
}
