//! Multi-file configuration loading.
//!
//! A configuration file may pull other files in with `include = "x.toml"` or
//! `include = ["a.toml", "b.toml"]`. Included files may include further
//! files; relative include paths resolve against the directory of the file
//! that names them. Every top-level section must be defined in exactly one file, and a
//! file may appear only once in the include graph.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Loads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory the root configuration path is relative to.
	base_path: PathBuf,
	/// Canonical paths already visited.
	visited: Vec<PathBuf>,
	/// Top-level section name to the file that defined it.
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	/// Creates a loader resolving relative paths against `base_path`.
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: Vec::new(),
			owners: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `config_path`.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let root = locate(&self.base_path, config_path.as_ref())?;

		let mut merged = toml::map::Map::new();
		let mut pending = vec![root];
		while let Some(path) = pending.pop() {
			let mut table = self.read_table(&path).await?;
			let includes = match table.remove("include") {
				Some(value) => parse_includes(&value)?,
				None => Vec::new(),
			};

			for (section, value) in table {
				if let Some(owner) = self.owners.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						section,
						owner.display(),
						path.display()
					)));
				}
				self.owners.insert(section.clone(), path.clone());
				merged.insert(section, value);
			}

			// Reverse so includes are visited in declaration order.
			let dir = path.parent().unwrap_or(self.base_path.as_path());
			for include in includes.iter().rev() {
				pending.push(locate(dir, include)?);
			}
		}

		let config: Config = toml::Value::Table(merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Reads one file, substitutes environment variables and parses it.
	async fn read_table(
		&mut self,
		path: &Path,
	) -> Result<toml::map::Map<String, toml::Value>, ConfigError> {
		let canonical = path.canonicalize()?;
		if self.visited.contains(&canonical) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}
		self.visited.push(canonical);

		let raw = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&raw)?;
		match toml::from_str::<toml::Value>(&resolved)? {
			toml::Value::Table(table) => Ok(table),
			_ => Err(ConfigError::Validation(format!(
				"{} is not a TOML table",
				path.display()
			))),
		}
	}

}

fn locate(dir: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		dir.join(path)
	};

	if !resolved.is_file() {
		return Err(ConfigError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("Configuration file not found: {}", resolved.display()),
		)));
	}
	Ok(resolved)
}

fn parse_includes(value: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
