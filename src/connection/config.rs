use std::collections::HashMap;

/// Resolves a connection token (e.g. `"APP_DB"`) to a connection string.
pub trait TokenSource: Send + Sync {
    fn lookup(&self, token: &str) -> Option<String>;
}

/// Looks tokens up in the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvTokenSource;

impl TokenSource for EnvTokenSource {
    fn lookup(&self, token: &str) -> Option<String> {
        std::env::var(token).ok()
    }
}

/// A fixed token table.
#[derive(Debug, Clone, Default)]
pub struct MapTokenSource {
    entries: HashMap<String, String>,
}

impl MapTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, connection_string: &str) -> Self {
        self.entries
            .insert(token.to_string(), connection_string.to_string());
        self
    }
}

impl TokenSource for MapTokenSource {
    fn lookup(&self, token: &str) -> Option<String> {
        self.entries.get(token).cloned()
    }
}

/// Connection resolution settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Token or connection string used when a call passes an empty token.
    pub default_connection: Option<String>,

    /// Look tokens up in the `TokenSource` before using them literally.
    pub resolve_tokens: bool,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self {
            default_connection: None,
            resolve_tokens: true,
        }
    }

    /// Set the fallback token for calls made with an empty token
    pub fn default_connection(mut self, token: &str) -> Self {
        self.default_connection = Some(token.to_string());
        self
    }

    /// Enable or disable token lookup
    pub fn resolve_tokens(mut self, resolve: bool) -> Self {
        self.resolve_tokens = resolve;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(default) = &self.default_connection {
            if default.trim().is_empty() {
                return Err("default_connection cannot be blank".to_string());
            }
        }
        Ok(())
    }

    /// Turns a caller token into the connection string handed to the
    /// connector. An empty token is replaced by `default_connection` when
    /// one is configured and otherwise reaches the connector as `""`.
    pub fn resolve(&self, token: &str, source: &dyn TokenSource) -> String {
        let token = match (token.is_empty(), self.default_connection.as_deref()) {
            (true, Some(default)) => default,
            _ => token,
        };

        if token.is_empty() || !self.resolve_tokens {
            return token.to_string();
        }

        match source.lookup(token) {
            Some(resolved) => {
                tracing::debug!(token, "connection token resolved from source");
                resolved
            }
            None => token.to_string(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}
