use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::warn;
use voxstream_world::WorldgenConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/worldgen.toml";

/// Load configuration from an explicit path, falling back to defaults on errors.
pub fn load_from_path(path: &Path) -> WorldgenConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<WorldgenConfig>(&contents) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                WorldgenConfig::default()
            }
        },
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                warn!(
                    "World generation config not found at {}. Using defaults",
                    path.display()
                );
            } else {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            }
            WorldgenConfig::default()
        }
    }
}

/// Write configuration as TOML, creating parent directories.
pub fn save_to_path(config: &WorldgenConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
