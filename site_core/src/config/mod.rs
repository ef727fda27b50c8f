pub mod settings;

pub use settings::{AppConfig, AuthConfig, CorsConfig, JobsConfig, ServerConfig, SmtpConfig};
