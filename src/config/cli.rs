use crate::utils::error::{MalError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// Show an anime by id, or your list status by name
    Get,
    /// Show selected fields of an anime
    Fields,
    /// Search for the closest title
    Search,
    /// Update the status of one anime
    Update,
    /// Update every anime listed in a file
    UpdateCollection,
    /// Convert a text list to JSON
    Convert,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "mal-organizer")]
#[command(about = "Keep your MyAnimeList statuses in sync with a local anime list")]
#[command(version)]
pub struct CliConfig {
    #[arg(long, value_enum, help = "The command to execute")]
    pub command: Option<Command>,

    #[arg(long, help = "The name of the anime")]
    pub name: Option<String>,

    #[arg(long, help = "The MyAnimeList ID of the anime")]
    pub id: Option<u64>,

    #[arg(long, help = "New status, e.g. 'Watching - S.2 Ep.14'")]
    pub status: Option<String>,

    #[arg(long, help = "Anime list file (.txt or .json)")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Output file for the convert command")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Show what would be updated without sending anything")]
    pub dry_run: bool,

    #[arg(short, long, help = "Show log messages on screen")]
    pub verbose: bool,

    #[arg(short, long, help = "Activate debug logs")]
    pub debug: bool,
}

impl CliConfig {
    pub fn require_name(&self) -> Result<&str> {
        validation::require_text("name", self.name.as_deref())
    }

    pub fn require_id(&self) -> Result<u64> {
        validation::require("id", self.id)
    }

    pub fn require_status(&self) -> Result<&str> {
        validation::require_text("status", self.status.as_deref())
    }

    pub fn require_file(&self) -> Result<&Path> {
        self.file.as_deref().ok_or_else(|| MalError::ValidationError {
            message: "No file selected".to_string(),
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let Some(command) = self.command else {
            return Err(MalError::ValidationError {
                message: "No command provided".to_string(),
            });
        };

        match command {
            Command::Get => {
                if self.id.is_none() {
                    self.require_name()?;
                }
            }
            Command::Fields => {
                self.require_id()?;
            }
            Command::Search => {
                self.require_name()?;
            }
            Command::Update => {
                self.require_name()?;
                self.require_status()?;
            }
            Command::UpdateCollection => {
                validation::validate_file_extension("file", self.require_file()?, &["txt", "json"])?;
            }
            Command::Convert => {
                validation::validate_file_extension("file", self.require_file()?, &["txt"])?;
                if let Some(output) = &self.output {
                    validation::validate_file_extension("output", output, &["json"])?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("mal-organizer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_update_command() {
        let config = parse(&["--command", "update", "--name", "Berserk", "--status", "Watching - Ep.3", "-v"]);
        assert_eq!(config.command, Some(Command::Update));
        assert_eq!(config.name.as_deref(), Some("Berserk"));
        assert!(config.verbose);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_update_collection_requires_file() {
        let config = parse(&["--command", "update-collection"]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MalError::ValidationError { message } if message == "No file selected"));

        let config = parse(&["--command", "update-collection", "--file", "animes.csv"]);
        assert!(config.validate().is_err());

        let config = parse(&["--command", "update-collection", "--file", "animes.json"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_convert_checks_extensions() {
        assert!(parse(&["--command", "convert", "--file", "animes.txt"]).validate().is_ok());
        assert!(parse(&["--command", "convert", "--file", "animes.json"]).validate().is_err());
        assert!(parse(&["--command", "convert", "--file", "animes.txt", "--output", "out.csv"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let config = parse(&["--command", "search", "--name", "  "]);
        assert!(matches!(
            config.validate(),
            Err(MalError::InvalidConfigValueError { field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_missing_command() {
        let config = parse(&["--name", "Berserk"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_get_accepts_id_or_name() {
        assert!(parse(&["--command", "get", "--id", "1"]).validate().is_ok());
        assert!(parse(&["--command", "get", "--name", "Monster"]).validate().is_ok());
        assert!(parse(&["--command", "get"]).validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_command() {
        let result = CliConfig::try_parse_from(["mal-organizer", "--command", "delete"]);
        assert!(result.is_err());
    }
}
