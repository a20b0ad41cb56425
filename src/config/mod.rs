pub mod settings;
pub mod types;

pub use settings::Settings;
pub use types::BotConfig;
