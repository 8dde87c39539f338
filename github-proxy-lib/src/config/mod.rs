mod github;
mod loader;
mod root;
mod security;
mod telemetry;
mod timeout;
mod validator;

pub use github::{ContentConfig, CredentialConfig, GitHubConfig};
pub use loader::{load_from_path, parse_config, read_from_path};
pub use root::Config;
pub use security::{RateLimitConfig, SecurityConfig};
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::TimeoutConfig;
pub use validator::validate;
