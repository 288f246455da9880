use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the pantry home directory along with:
/// - an initial `config.json` file with default settings
/// - an empty, fully migrated `pantry.sqlite` database
///
/// # Arguments
/// - `pantry_home` - The directory that will be the root of the data directory, e.g.
///   `$HOME/pantry`
///
/// # Errors
/// - Returns an error if a config file or database already exists there.
/// - Returns an error if any file operations fail.
pub async fn init(pantry_home: &Path) -> Result<Out<()>> {
    let config = Config::create(pantry_home)
        .await
        .context("Unable to create the pantry directory and config")?;
    Ok(format!(
        "Successfully created the pantry directory at {}",
        config.root().display()
    )
    .into())
}
