//! API credential resolution from the environment and the config file.

use std::collections::HashMap;

use idealista_common::{Credentials, Error, Result};
use idealista_storage::ConfigStore;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "IDEALISTA_API_KEY";
/// Environment variable holding the API secret.
pub const API_SECRET_VAR: &str = "IDEALISTA_API_SECRET";

/// Snapshot of the environment variables the resolver looks at.
#[derive(Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the credential variables of the current process.
    pub fn from_process() -> Self {
        Self::from_pairs(
            [API_KEY_VAR, API_SECRET_VAR]
                .into_iter()
                .filter_map(|name| std::env::var(name).ok().map(|value| (name, value))),
        )
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Determines which API key/secret to use.
pub struct CredentialResolver {
    env: Environment,
    config: ConfigStore,
}

impl CredentialResolver {
    pub fn new(env: Environment, config: ConfigStore) -> Self {
        Self { env, config }
    }

    /// Resolve credentials.
    ///
    /// When both environment variables are set the config file is not read.
    /// Otherwise key and secret each fall back to the config file on their
    /// own, so an environment key can pair with a stored secret.
    ///
    /// # Errors
    /// - `MissingCredentials` if either half is still missing
    /// - `CorruptState` if the config file has to be read and is malformed
    pub async fn resolve(&self) -> Result<Credentials> {
        let env_key = self.env.get(API_KEY_VAR);
        let env_secret = self.env.get(API_SECRET_VAR);

        if let (Some(key), Some(secret)) = (env_key, env_secret) {
            return Ok(Credentials {
                api_key: key.to_string(),
                api_secret: secret.to_string(),
            });
        }

        let stored = self.config.load().await?;
        let api_key = env_key.map(str::to_string).or(stored.api_key);
        let api_secret = env_secret.map(str::to_string).or(stored.api_secret);

        match (api_key, api_secret) {
            (Some(api_key), Some(api_secret)) => Ok(Credentials {
                api_key,
                api_secret,
            }),
            _ => Err(Error::MissingCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idealista_storage::MemoryStore;
    use std::sync::Arc;

    fn config(text: Option<&str>) -> ConfigStore {
        let store = match text {
            Some(text) => MemoryStore::with_contents("config", text),
            None => MemoryStore::new("config"),
        };
        ConfigStore::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_env_pair_wins_without_reading_config() {
        // A corrupt config would fail resolution if it were read.
        let resolver = CredentialResolver::new(
            Environment::from_pairs([(API_KEY_VAR, "env-key"), (API_SECRET_VAR, "env-secret")]),
            config(Some("{broken")),
        );

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.api_secret, "env-secret");
    }

    #[tokio::test]
    async fn test_env_key_with_config_secret() {
        let resolver = CredentialResolver::new(
            Environment::from_pairs([(API_KEY_VAR, "env-key")]),
            config(Some(r#"{"api_key": "cfg-key", "api_secret": "cfg-secret"}"#)),
        );

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.api_secret, "cfg-secret");
    }

    #[tokio::test]
    async fn test_env_secret_with_config_key() {
        let resolver = CredentialResolver::new(
            Environment::from_pairs([(API_SECRET_VAR, "env-secret")]),
            config(Some(r#"{"api_key": "cfg-key"}"#)),
        );

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.api_key, "cfg-key");
        assert_eq!(creds.api_secret, "env-secret");
    }

    #[tokio::test]
    async fn test_config_only() {
        let resolver = CredentialResolver::new(
            Environment::default(),
            config(Some(r#"{"api_key": "cfg-key", "api_secret": "cfg-secret"}"#)),
        );

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.api_key, "cfg-key");
    }

    #[tokio::test]
    async fn test_empty_env_value_counts_as_unset() {
        let resolver = CredentialResolver::new(
            Environment::from_pairs([(API_KEY_VAR, ""), (API_SECRET_VAR, "env-secret")]),
            config(Some(r#"{"api_key": "cfg-key"}"#)),
        );

        let creds = resolver.resolve().await.unwrap();
        assert_eq!(creds.api_key, "cfg-key");
    }

    #[tokio::test]
    async fn test_missing_half_fails() {
        let resolver = CredentialResolver::new(
            Environment::from_pairs([(API_KEY_VAR, "env-key")]),
            config(None),
        );

        assert!(matches!(
            resolver.resolve().await,
            Err(Error::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_corrupt_config_propagates_when_needed() {
        let resolver = CredentialResolver::new(Environment::default(), config(Some("{broken")));

        assert!(matches!(
            resolver.resolve().await,
            Err(Error::CorruptState { .. })
        ));
    }
}
