//! CLI command implementations

pub mod config;
pub mod edit;
pub mod inspect;
pub mod store;

use anyhow::Result;
use clap::Subcommand;
use console::{style, Emoji};
use std::path::PathBuf;
use stowage::config::StowageConfig;

use crate::{open_records, open_service};

static SUCCESS: Emoji = Emoji("✓", "√");
static INFO: Emoji = Emoji("ℹ", "i");

/// File management commands
#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// Store a local file under a logical path
    ///
    /// Examples:
    ///   stowage store ./Quarterly\ Report.pdf reports/2024
    ///   stowage store ./photo.jpg media --title "Team photo"
    Store {
        /// File to read
        file: PathBuf,

        /// Logical directory to store under (e.g. `reports/2024`)
        path: String,

        /// Display title, also used as the base of the stored name
        #[arg(short, long)]
        title: Option<String>,

        /// Skip thumbnail derivation for images
        #[arg(long)]
        no_thumbnail: bool,
    },

    /// Show one stored file
    Get {
        /// Identifier returned by `store`
        uuid: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored files matching every given field exactly
    Search {
        /// Match identifier
        #[arg(long)]
        uuid: Option<String>,

        /// Match stored name
        #[arg(long)]
        name: Option<String>,

        /// Match logical directory
        #[arg(long)]
        path: Option<String>,

        /// Match title
        #[arg(long)]
        title: Option<String>,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a file's title, or clear it when no title is given
    UpdateTitle {
        /// Identifier of the file
        uuid: String,

        /// New title
        title: Option<String>,
    },

    /// Delete a stored file along with its thumbnail
    Delete {
        /// Identifier of the file
        uuid: String,
    },

    /// Create the database and apply pending schema migrations
    Migrate,

    /// Print the effective configuration as TOML
    Config,
}

impl FilesCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The storage root or database cannot be opened
    /// - No file exists with the given identifier
    /// - A storage or database operation fails
    pub async fn execute(&self, config: &StowageConfig) -> Result<()> {
        match self {
            Self::Config => {
                println!("{}", config::render(config)?);
                return Ok(());
            }
            Self::Migrate => {
                open_records(config).await?;
                println!(
                    "{SUCCESS} Database {} is up to date",
                    style(&config.database.url).cyan()
                );
                return Ok(());
            }
            _ => {}
        }

        let service = open_service(config).await?;

        match self {
            Self::Store {
                file,
                path,
                title,
                no_thumbnail,
            } => {
                let record =
                    store::store_file(&service, file, path, title.as_deref(), !no_thumbnail)
                        .await?;
                println!(
                    "{} Stored {} as {}",
                    SUCCESS,
                    style(file.display()).bold(),
                    style(record.pathname()).green()
                );
                println!("{}", inspect::describe(&service, &record).await?);
            }
            Self::Get { uuid, json } => {
                let record = service.get(uuid).await?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                } else {
                    println!("{}", inspect::describe(&service, &record).await?);
                }
            }
            Self::Search {
                uuid,
                name,
                path,
                title,
                json,
            } => {
                let filter = inspect::filter(
                    uuid.as_deref(),
                    name.as_deref(),
                    path.as_deref(),
                    title.as_deref(),
                );
                let records = service.search(&filter).await?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else if records.is_empty() {
                    println!("{} {}", INFO, style("No matching files").dim());
                } else {
                    println!("{}", crate::output::table(&records));
                }
            }
            Self::UpdateTitle { uuid, title } => {
                edit::set_title(&service, uuid, title.as_deref()).await?;
                match title {
                    Some(title) => println!("{SUCCESS} Title of {uuid} set to {}", style(title).cyan()),
                    None => println!("{SUCCESS} Title of {uuid} cleared"),
                }
            }
            Self::Delete { uuid } => {
                service.delete(uuid).await?;
                println!("{SUCCESS} Deleted {}", style(uuid).cyan());
            }
            Self::Migrate | Self::Config => {}
        }

        Ok(())
    }
}
