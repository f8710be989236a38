use crate::errors::Error;
use rand::Rng;
use tokio::task::spawn_blocking;

/// Hash `password` into an encoded argon2 string with a random salt. Runs on
/// the blocking pool since hashing is deliberately slow.
pub async fn hash(password: String) -> Result<String, Error> {
    spawn_blocking(move || {
        let salt: [u8; 16] = rand::thread_rng().gen();
        let config = argon2::Config::default();
        Ok(argon2::hash_encoded(password.as_bytes(), &salt, &config)?)
    })
    .await?
}

/// Verify `password` against an encoded argon2 `hash`.
pub async fn verify(hash: String, password: String) -> Result<bool, Error> {
    spawn_blocking(move || Ok(argon2::verify_encoded(&hash, password.as_bytes())?)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify() {
        let encoded = hash("wheelie".to_string()).await.unwrap();
        assert!(verify(encoded.clone(), "wheelie".to_string()).await.unwrap());
        assert!(!verify(encoded, "nosegrab".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn salts_are_random() {
        let first = hash("wheelie".to_string()).await.unwrap();
        let second = hash("wheelie".to_string()).await.unwrap();
        assert_ne!(first, second);
    }
}
