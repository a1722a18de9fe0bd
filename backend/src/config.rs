use std::env;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid PORT value: {0:?}")]
    InvalidPort(String),
}

/// The single login the development service accepts.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for DemoAccount {
    fn default() -> Self {
        Self {
            email: "demo@khetgpt.com".to_string(),
            password: "password".to_string(),
            name: "Demo User".to_string(),
        }
    }
}

impl DemoAccount {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.email.eq_ignore_ascii_case(username.trim()) && self.password == password
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub demo: DemoAccount,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let defaults = DemoAccount::default();
        let demo = DemoAccount {
            email: lookup("DEMO_EMAIL").unwrap_or(defaults.email),
            password: lookup("DEMO_PASSWORD").unwrap_or(defaults.password),
            name: lookup("DEMO_NAME").unwrap_or(defaults.name),
        };

        Ok(Self {
            port,
            jwt_secret,
            demo,
        })
    }
}
