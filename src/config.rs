use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::Parser;
use log::{debug, error, info, warn};
use strum::{Display, IntoStaticStr};

use crate::error::{BotError, Result};
use crate::moderation::PatternMatcher;

/// Discord bot that removes messages matching configured flag patterns.
#[derive(Parser, Debug)]
#[command(name = "flagbot", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Bot token.
    #[arg(short, long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Configuration directory path.
    #[arg(short, long, env = "FLAGBOT_CONFIG_DIR", default_value = "configuration")]
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub config_dir: PathBuf,
}

impl Config {
    /// Resolve the token and configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingToken`] if no non-blank token was given.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        debug!("Resolving configuration from command line and environment");

        let discord_token = match cli.token {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                error!("Failed to load Discord token from arguments or DISCORD_TOKEN");
                return Err(BotError::MissingToken);
            }
        };

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("Configuration directory: {}", cli.config_dir.display());

        Ok(Self {
            discord_token,
            config_dir: cli.config_dir,
        })
    }
}

/// The plain-text files expected inside the configuration directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ConfigFile {
    #[strum(serialize = "gifs.txt")]
    Gifs,
    #[strum(serialize = "responses.txt")]
    Responses,
    #[strum(serialize = "patterns.txt")]
    Patterns,
}

impl ConfigFile {
    #[must_use]
    pub fn path_in(self, dir: &Path) -> PathBuf {
        let name: &'static str = self.into();
        dir.join(name)
    }
}

/// Read one entry per line, in file order.
///
/// Blank lines are dropped; a blank detection pattern would match every message.
///
/// # Errors
///
/// Returns [`BotError::ConfigLoad`] if the file cannot be opened or read.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let to_err = |source| BotError::ConfigLoad {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(to_err)?;
        if line.trim().is_empty() {
            continue;
        }
        lines.push(line);
    }

    debug!("Read {} entries from {}", lines.len(), path.display());
    Ok(lines)
}

/// Immutable moderation configuration shared by every message handler.
#[derive(Debug)]
pub struct ModerationSet {
    responses: Vec<String>,
    media: Vec<String>,
    matcher: PatternMatcher,
}

impl ModerationSet {
    /// Build a set from in-memory lists.
    ///
    /// # Errors
    ///
    /// Fails if any list is empty or a pattern does not compile.
    pub fn new(responses: Vec<String>, media: Vec<String>, patterns: &[String]) -> Result<Self> {
        if responses.is_empty() {
            return Err(BotError::EmptyConfig(ConfigFile::Responses));
        }
        if media.is_empty() {
            return Err(BotError::EmptyConfig(ConfigFile::Gifs));
        }
        if patterns.is_empty() {
            return Err(BotError::EmptyConfig(ConfigFile::Patterns));
        }

        Ok(Self {
            responses,
            media,
            matcher: PatternMatcher::compile(patterns)?,
        })
    }

    /// Load `gifs.txt`, `responses.txt` and `patterns.txt` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing, unreadable or empty, or if a
    /// pattern is not a valid regular expression.
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading moderation configuration from {}", dir.display());

        let media = load_lines(&ConfigFile::Gifs.path_in(dir))?;
        let responses = load_lines(&ConfigFile::Responses.path_in(dir))?;
        let patterns = load_lines(&ConfigFile::Patterns.path_in(dir))?;

        let set = Self::new(responses, media, &patterns)?;
        info!(
            "Loaded {} responses, {} media links and {} patterns",
            set.responses.len(),
            set.media.len(),
            set.matcher.len()
        );
        for entry in set.self_triggering_entries() {
            warn!(
                "Reply '{entry}' matches a detection pattern; the bot will delete and answer its own message"
            );
        }
        Ok(set)
    }

    /// Responses and media links that a detection pattern would flag once posted.
    ///
    /// Responses are checked as the bot sends them, behind an author mention.
    #[must_use]
    pub fn self_triggering_entries(&self) -> Vec<&str> {
        self.responses
            .iter()
            .filter(|response| self.matcher.matches(&format!("<@0> {response}")))
            .chain(self.media.iter().filter(|link| self.matcher.matches(link)))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    #[must_use]
    pub fn media(&self) -> &[String] {
        &self.media
    }

    #[must_use]
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }
}
