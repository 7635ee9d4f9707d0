pub mod app_config;
pub mod channel;
pub mod config;
pub mod fairscore;

pub use app_config::{AppConfig, Environment};
pub use channel::{ChannelTag, TagExtraction};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use fairscore::{is_fresh, is_fresh_within, CachedScore, ScoreExtraction};
