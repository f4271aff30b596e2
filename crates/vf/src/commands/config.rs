//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/vf/config.toml.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use vecfilter::render::{BackendKind, FieldMap, RenderConfig};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Backend used by `vf render` when neither the flag nor the config names one.
pub const DEFAULT_BACKEND: BackendKind = BackendKind::PgVector;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# vf - filter expression compiler configuration

# Config schema version (do not modify)
version = 1

# Default backend for `vf render`:
# "text", "sql", "pgvector", "neo4j", "mongo" or "chroma"
# backend = "pgvector"

[render]
# metadata_column = "metadata"  # JSONB column (sql, pgvector) / property prefix (neo4j)
# node_alias = "node"           # Cypher node variable (neo4j)

# Translate filter field names to backend field names
[field_map]
# country = "country_code"
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default render backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Renderer settings.
    #[serde(default)]
    pub render: RenderSettings,

    /// Filter field name to backend field name.
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub field_map: FieldMap,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: None,
            render: RenderSettings::default(),
            field_map: FieldMap::new(),
        }
    }
}

/// Renderer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// JSONB metadata column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_column: Option<String>,

    /// Cypher node variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_alias: Option<String>,
}

impl Config {
    /// The configured default backend, if any.
    pub fn backend(&self) -> Result<Option<BackendKind>> {
        self.backend
            .as_deref()
            .map(|name| {
                name.parse::<BackendKind>()
                    .map_err(|e| CommandError::Config(e.to_string()))
            })
            .transpose()
    }

    /// Renderer configuration with unset values at their defaults.
    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::with_field_map(self.field_map.clone());
        if let Some(column) = &self.render.metadata_column {
            config.metadata_column = column.clone();
        }
        if let Some(alias) = &self.render.node_alias {
            config.node_alias = alias.clone();
        }
        config
    }
}

/// Gets the config file path.
///
/// `--config` (or `VF_CONFIG`, which clap folds into the flag) wins, then
/// `$XDG_CONFIG_HOME/vf/config.toml`, then `~/.config/vf/config.toml`.
pub fn get_config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg_config).join("vf").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("vf").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from `path`, or defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    log::debug!("loaded config from {}", path.display());
    migrate_config(config)
}

/// Loads the configuration for the current invocation.
pub fn load_context_config(ctx: &CommandContext) -> Result<Config> {
    let path = get_config_path(ctx.config_path.as_deref())?;
    load_config(&path)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        log::warn!(
            "config version {} is newer than this vf understands ({}), reading it anyway",
            config.version,
            CONFIG_VERSION
        );
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(path: &Path, config: &Config) -> Result<()> {
    ensure_parent_dir(path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path(ctx.config_path.as_deref())?;
    let config = load_config(&path)?;
    let backend = config.backend()?.unwrap_or(DEFAULT_BACKEND);
    let render = config.render_config();

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
            "effective": {
                "backend": backend,
                "render": render,
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let marker = |set: bool| if set { "" } else { " (default)" };
        println!("  backend: {}{}", backend, marker(config.backend.is_some()));

        println!("\n[render]");
        println!(
            "  metadata_column: {}{}",
            render.metadata_column,
            marker(config.render.metadata_column.is_some())
        );
        println!(
            "  node_alias: {}{}",
            render.node_alias,
            marker(config.render.node_alias.is_some())
        );

        println!("\n[field_map]");
        if config.field_map.is_empty() {
            println!("  (none)");
        }
        for (name, field) in &config.field_map {
            println!("  {} = {}", name, field);
        }

        if !path.exists() {
            println!("\n(No config file exists. Run 'vf config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path(ctx.config_path.as_deref())?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {}. Use --force to overwrite it.",
            path.display()
        )));
    }

    ensure_parent_dir(&path)?;
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `key = value` setting to `config`.
///
/// An empty value for a `field_map.<name>` key removes that mapping.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = match key.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (None, key),
    };

    match (section, field) {
        (None, "backend") => {
            let backend = value
                .parse::<BackendKind>()
                .map_err(|e| CommandError::Config(e.to_string()))?;
            config.backend = Some(backend.name().to_string());
        }
        (Some("render"), "metadata_column") => {
            config.render.metadata_column = Some(non_empty(key, value)?);
        }
        (Some("render"), "node_alias") => {
            config.render.node_alias = Some(non_empty(key, value)?);
        }
        (Some("field_map"), name) if !name.is_empty() => {
            if value.is_empty() {
                config.field_map.remove(name);
            } else {
                config.field_map.insert(name.to_string(), value.to_string());
            }
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: backend, render.metadata_column, render.node_alias, field_map.<name>",
                key
            )));
        }
    }
    Ok(())
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        Err(CommandError::Config(format!("{} cannot be empty", key)))
    } else {
        Ok(value.to_string())
    }
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let path = get_config_path(ctx.config_path.as_deref())?;
    let mut config = load_config(&path)?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&path, &config)?;
    log::debug!("wrote {} to {}", opts.key, path.display());

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path(ctx.config_path.as_deref())?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.backend.is_none());
        assert!(config.field_map.is_empty());
        assert_eq!(config.render_config(), RenderConfig::default());
    }

    #[test]
    fn test_default_config_file_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1
backend = "neo4j"

[render]
node_alias = "doc"

[field_map]
country = "country_code"
"author.name" = "author_name"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend().unwrap(), Some(BackendKind::Neo4j));

        let render = config.render_config();
        assert_eq!(render.node_alias, "doc");
        assert_eq!(render.metadata_column, "metadata");
        assert_eq!(
            render.field_map.get("author.name").map(String::as_str),
            Some("author_name")
        );
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        // Missing version defaults to current version
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.backend().unwrap(), None);
    }

    #[test]
    fn test_invalid_backend_suggests_name() {
        let config: Config = toml::from_str(r#"backend = "pgvectr""#).unwrap();
        let err = config.backend().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: unknown backend 'pgvectr' (did you mean 'pgvector'?)"
        );
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        apply_setting(&mut config, "backend", "SQL").unwrap();
        apply_setting(&mut config, "render.metadata_column", "doc_meta").unwrap();
        apply_setting(&mut config, "field_map.country", "country_code").unwrap();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("backend = \"sql\""));
        assert!(toml_str.contains("[render]"));
        assert!(toml_str.contains("metadata_column = \"doc_meta\""));
        assert!(toml_str.contains("[field_map]"));

        let reloaded: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_apply_setting_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "backend", "oracle").is_err());
        assert!(apply_setting(&mut config, "render.node_alias", " ").is_err());
        assert!(apply_setting(&mut config, "render.color", "true").is_err());
        assert!(apply_setting(&mut config, "field_map.", "x").is_err());
        assert!(apply_setting(&mut config, "token", "x").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_setting_removes_field_mapping() {
        let mut config = Config::default();
        apply_setting(&mut config, "field_map.country", "country_code").unwrap();
        apply_setting(&mut config, "field_map.country", "").unwrap();
        assert!(config.field_map.is_empty());
    }

    #[test]
    fn test_migrate_config_preserves_data() {
        let mut config = Config {
            version: 999,
            backend: Some("mongo".to_string()),
            ..Config::default()
        };
        config
            .field_map
            .insert("a".to_string(), "b".to_string());

        let migrated = migrate_config(config.clone()).unwrap();
        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.backend, config.backend);
        assert_eq!(migrated.field_map, config.field_map);
    }

    #[test]
    fn test_load_missing_config_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "backend = [").unwrap();
        assert!(matches!(load_config(&path), Err(CommandError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        apply_setting(&mut config, "render.node_alias", "chunk").unwrap();

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_config_path_override() {
        let path = get_config_path(Some(Path::new("/tmp/custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    #[serial]
    fn test_config_path_uses_xdg_config_home() {
        let original = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", "/tmp/vf-xdg");

        let path = get_config_path(None);

        match original {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(path.unwrap(), PathBuf::from("/tmp/vf-xdg/vf/config.toml"));
    }
}
