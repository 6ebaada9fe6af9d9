use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

const DB_KEY: &str = "ART_CATALOG_DB";
const IMAGES_KEY: &str = "ART_CATALOG_IMAGES";
const DEFAULT_DIR: &str = "ArtManager";

/// Where the catalog keeps its database and image blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
    pub image_dir: PathBuf,
}

impl CatalogConfig {
    /// `<root>/art.db` and `<root>/images`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            db_path: root.join("art.db"),
            image_dir: root.join("images"),
        }
    }
}

/// Main entry point to get catalog paths.
/// Checks the env file first, then falls back to `~/ArtManager` and records
/// that choice in the env file.
pub fn get_catalog_paths(env_path: &Path) -> Result<CatalogConfig> {
    if env_path.exists() {
        if let Ok(config) = load_from_env(env_path) {
            info!("Loaded catalog paths from {:?}", env_path);
            return Ok(config);
        }
    }

    let config = default_paths()?;
    info!("Using default catalog location {:?}", config.db_path.parent());

    save_to_env(env_path, &config)?;
    info!("Saved paths to {:?}", env_path);

    Ok(config)
}

fn default_paths() -> Result<CatalogConfig> {
    let home = directories::BaseDirs::new().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(CatalogConfig::from_root(&home.home_dir().join(DEFAULT_DIR)))
}

fn load_from_env(path: &Path) -> Result<CatalogConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut db_path = None;
    let mut image_dir = None;

    for line in reader.lines() {
        let line = line?;
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                DB_KEY => db_path = Some(PathBuf::from(value.trim())),
                IMAGES_KEY => image_dir = Some(PathBuf::from(value.trim())),
                _ => {}
            }
        }
    }

    if let (Some(db_path), Some(image_dir)) = (db_path, image_dir) {
        Ok(CatalogConfig { db_path, image_dir })
    } else {
        Err(anyhow!("Incomplete env file"))
    }
}

fn save_to_env(path: &Path, config: &CatalogConfig) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    writeln!(file, "{}={}", DB_KEY, config.db_path.display())?;
    writeln!(file, "{}={}", IMAGES_KEY, config.image_dir.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_env() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join(".env");
        let config = CatalogConfig::from_root(Path::new("/tmp/art"));

        save_to_env(&path, &config)?;

        let content = fs::read_to_string(&path)?;
        assert!(content.contains("ART_CATALOG_DB=/tmp/art/art.db"));
        assert!(content.contains("ART_CATALOG_IMAGES=/tmp/art/images"));

        assert_eq!(load_from_env(&path)?, config);
        assert_eq!(get_catalog_paths(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_incomplete_env_is_rejected() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join(".env");
        fs::write(&path, "ART_CATALOG_DB=/tmp/art.db\nOTHER=1\n")?;

        assert!(load_from_env(&path).is_err());
        Ok(())
    }
}
