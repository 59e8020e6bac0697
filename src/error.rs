use std::{io, path::PathBuf};

use thiserror::Error;

use crate::config::ConfigFile;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error(
        "Missing Discord token. Proper usage: flagbot -t <bot token> -c <configuration path>"
    )]
    MissingToken,

    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration file {0} contains no entries")]
    EmptyConfig(ConfigFile),

    #[error("Invalid detection pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Whether the error happened before any connection to Discord was attempted.
    #[must_use]
    pub fn is_startup(&self) -> bool {
        !matches!(self, BotError::Serenity(_))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
