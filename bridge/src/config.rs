//! Process-level configuration: `.env` loading and the signing key.

use std::{env, fmt, path::Path};

use crate::error::BridgeError;

pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// Hex-encoded secp256k1 key. Never printed.
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, BridgeError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(BridgeError::Credential("private key is empty".to_string()));
        }
        Ok(Self(raw))
    }

    /// Reads the key from `PRIVATE_KEY`.
    pub fn from_env() -> Result<Self, BridgeError> {
        let raw = env::var(PRIVATE_KEY_VAR).map_err(|_| {
            BridgeError::Credential(format!("{PRIVATE_KEY_VAR} environment variable is required"))
        })?;
        Self::new(raw)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Loads variables from `path` into the environment when the file exists.
/// Variables already set take precedence.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<(), BridgeError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    dotenvy::from_path(path).map_err(|e| {
        BridgeError::configuration(format!("failed to load {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::signer_from_key;

    // Anvil's first development key.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_key_is_redacted() {
        let key = PrivateKey::new(DEV_KEY).unwrap();
        assert_eq!(format!("{key:?}"), "PrivateKey(<redacted>)");
        assert_eq!(key.to_string(), "<redacted>");
    }

    #[test]
    fn test_valid_key_derives_account() {
        let key = PrivateKey::new(DEV_KEY).unwrap();
        let signer = signer_from_key(&key).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_bad_keys_are_credential_errors() {
        assert!(matches!(
            PrivateKey::new("   "),
            Err(BridgeError::Credential(_))
        ));

        let key = PrivateKey::new("not-a-key").unwrap();
        assert!(matches!(
            signer_from_key(&key),
            Err(BridgeError::Credential(_))
        ));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        load_dotenv("/nonexistent/.env").unwrap();
    }
}
