//! Config file resolution and `plancheck config`.

use std::path::{Path, PathBuf};

use plancheck_recon::CompareConfig;
use tracing::{debug, info};

use crate::exit_codes::EXIT_INPUT_READ;
use crate::CliError;

/// A loaded config and the file it came from, if any.
pub struct LoadedConfig {
    pub config: CompareConfig,
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Resolve a path written in the config relative to the config file's directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match self.source.as_deref().and_then(Path::parent) {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// `<config dir>/plancheck/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plancheck").join("config.toml"))
}

/// An explicit path must exist; the default path is used only when present;
/// otherwise built-in defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, CliError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path().filter(|p| p.is_file()),
    };

    let Some(path) = path else {
        debug!("no config file, using defaults");
        return Ok(LoadedConfig { config: CompareConfig::default(), source: None });
    };

    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::new(EXIT_INPUT_READ, format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = CompareConfig::from_toml(&text).map_err(|e| {
        let mut err = CliError::from(e);
        err.message = format!("{}: {}", path.display(), err.message);
        err
    })?;
    info!(path = %path.display(), name = %config.name, "config loaded");
    Ok(LoadedConfig { config, source: Some(path) })
}

pub fn cmd_config_validate(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = match path.or_else(default_config_path) {
        Some(p) => p,
        None => return Err(CliError::usage("no config path given and no config directory on this platform")),
    };
    if !path.is_file() {
        return Err(CliError::new(EXIT_INPUT_READ, format!("config not found: {}", path.display())));
    }

    let loaded = load(Some(&path))?;
    let c = &loaded.config;
    eprintln!("{}: ok", path.display());
    eprintln!(
        "  name: {}, threshold: {}, embedding: {:?}, aliases: {}",
        c.name,
        c.matching.threshold,
        c.embedding.provider,
        c.aliases.len()
    );
    if let Some(ref file) = c.reference.file {
        let resolved = loaded.resolve(file);
        if !resolved.is_file() {
            eprintln!("  warning: reference file {} does not exist", resolved.display());
        }
    }
    Ok(())
}

pub fn cmd_config_path() -> Result<(), CliError> {
    match default_config_path() {
        Some(p) => {
            println!("{}", p.display());
            Ok(())
        }
        None => Err(CliError::usage("no config directory on this platform")),
    }
}
