//! Agent configuration.

/// Server address used when none is given.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server port used when none is given.
pub const DEFAULT_PORT: u16 = 1024;

/// Player name used when none is given.
pub const DEFAULT_NAME: &str = "Test";

/// Consecutive chooser failures answered with a fresh snapshot request.
pub const DEFAULT_DECISION_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub decision_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            decision_retries: DEFAULT_DECISION_RETRIES,
        }
    }
}

impl AgentConfig {
    /// Config for `name` with every other field at its default.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
