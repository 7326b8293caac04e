//! JWT configuration, loaded through `core_config::FromEnv`.

use core_config::{ConfigError, FromEnv, env_parse, env_required};

/// Default token lifetime: 15 minutes
pub const DEFAULT_EXPIRY_SECS: i64 = 900;

/// Minimum secret length accepted for HS256 signing
pub const MIN_SECRET_LEN: usize = 32;

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_EXPIRY_SECS` (default 900)
///
/// ```ignore
/// let config = JwtConfig::from_env()?;
///
/// // Manual construction (for testing)
/// let config = JwtConfig::new("my-super-secret-key-that-is-at-least-32-chars");
/// ```
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// Signing secret
    pub secret: String,
    /// Lifetime of issued tokens in seconds
    pub expiry_secs: i64,
}

impl JwtConfig {
    /// Create a new JwtConfig with the given secret and default expiry.
    ///
    /// # Panics
    /// Panics if the secret is shorter than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            expiry_secs: DEFAULT_EXPIRY_SECS,
        }
    }

    pub fn with_expiry_secs(mut self, expiry_secs: i64) -> Self {
        self.expiry_secs = expiry_secs;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        let expiry_secs = env_parse("JWT_EXPIRY_SECS", DEFAULT_EXPIRY_SECS)?;
        if expiry_secs <= 0 {
            return Err(ConfigError::ParseError {
                key: "JWT_EXPIRY_SECS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            secret,
            expiry_secs,
        })
    }
}
