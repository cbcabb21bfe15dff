use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::data::filters::CustomFieldTable;
use crate::utils::file::expand_path;
use crate::utils::sql::{is_valid_identifier, requalify};

use super::cli::{CliConfig, parse_time_zone};
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CATALOG_TABLE, DEFAULT_ENTITY_ID_COLUMN,
    DEFAULT_ENTITY_SCOPE_COLUMN, DEFAULT_ENTITY_TABLE, DEFAULT_TIME_ZONE,
    MYSQL_DEFAULT_ACQUIRE_TIMEOUT_SECS, MYSQL_DEFAULT_IDLE_TIMEOUT_SECS,
    MYSQL_DEFAULT_MAX_CONNECTIONS, MYSQL_DEFAULT_MIN_CONNECTIONS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// MySQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// MySQL connection URL (or use EVENTADMIN_MYSQL_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 1)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
}

/// Field catalog section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CatalogFileConfig {
    /// Catalog table name (default: "fields")
    pub table: Option<String>,
    /// Offline catalog JSON file; takes precedence over MySQL
    pub file: Option<String>,
}

/// Custom field value table layout (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomFieldsFileConfig {
    pub table: Option<String>,
    pub parent_key: Option<String>,
    pub key_column: Option<String>,
    pub field_column: Option<String>,
    pub text_column: Option<String>,
    pub list_column: Option<String>,
    pub boolean_column: Option<String>,
    pub numeric_column: Option<String>,
}

/// Filtered entity section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EntityFileConfig {
    pub table: Option<String>,
    pub scope_column: Option<String>,
    pub id_column: Option<String>,
}

/// Compiler section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompilerFileConfig {
    /// IANA time zone name (default: "UTC")
    pub time_zone: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub catalog: Option<CatalogFileConfig>,
    pub custom_fields: Option<CustomFieldsFileConfig>,
    pub entity: Option<EntityFileConfig>,
    pub compiler: Option<CompilerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `current` when `value` is set
fn merge_field<T: std::fmt::Debug>(name: &str, current: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        tracing::trace!(field = name, value = ?value, "Merging config field");
        *current = value;
    }
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(db) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            merge_field("database.url", &mut current.url, db.url);
            merge_field(
                "database.max_connections",
                &mut current.max_connections,
                db.max_connections,
            );
            merge_field(
                "database.min_connections",
                &mut current.min_connections,
                db.min_connections,
            );
            merge_field(
                "database.acquire_timeout_secs",
                &mut current.acquire_timeout_secs,
                db.acquire_timeout_secs,
            );
            merge_field(
                "database.idle_timeout_secs",
                &mut current.idle_timeout_secs,
                db.idle_timeout_secs,
            );
        }

        if let Some(catalog) = other.catalog {
            let current = self.catalog.get_or_insert_with(CatalogFileConfig::default);
            merge_field("catalog.table", &mut current.table, catalog.table);
            merge_field("catalog.file", &mut current.file, catalog.file);
        }

        if let Some(custom) = other.custom_fields {
            let current = self
                .custom_fields
                .get_or_insert_with(CustomFieldsFileConfig::default);
            merge_field("custom_fields.table", &mut current.table, custom.table);
            merge_field("custom_fields.parent_key", &mut current.parent_key, custom.parent_key);
            merge_field("custom_fields.key_column", &mut current.key_column, custom.key_column);
            merge_field(
                "custom_fields.field_column",
                &mut current.field_column,
                custom.field_column,
            );
            merge_field("custom_fields.text_column", &mut current.text_column, custom.text_column);
            merge_field("custom_fields.list_column", &mut current.list_column, custom.list_column);
            merge_field(
                "custom_fields.boolean_column",
                &mut current.boolean_column,
                custom.boolean_column,
            );
            merge_field(
                "custom_fields.numeric_column",
                &mut current.numeric_column,
                custom.numeric_column,
            );
        }

        if let Some(entity) = other.entity {
            let current = self.entity.get_or_insert_with(EntityFileConfig::default);
            merge_field("entity.table", &mut current.table, entity.table);
            merge_field("entity.scope_column", &mut current.scope_column, entity.scope_column);
            merge_field("entity.id_column", &mut current.id_column, entity.id_column);
        }

        if let Some(compiler) = other.compiler {
            let current = self.compiler.get_or_insert_with(CompilerFileConfig::default);
            merge_field("compiler.time_zone", &mut current.time_zone, compiler.time_zone);
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// MySQL configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    /// MySQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to keep warm
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,
}

/// Field catalog configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub table: String,
    /// Offline catalog file, used instead of MySQL when set
    pub file: Option<PathBuf>,
}

/// Filtered entity configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub table: String,
    pub scope_column: String,
    pub id_column: String,
}

impl EntityConfig {
    /// Same layout over `table`, with columns qualified by the configured
    /// table moved onto it
    pub fn retarget(&self, table: &str) -> Self {
        Self {
            table: table.to_string(),
            scope_column: requalify(&self.scope_column, &self.table, table),
            id_column: requalify(&self.id_column, &self.table, table),
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// None when no URL is configured anywhere
    pub mysql: Option<MysqlConfig>,
    pub catalog: CatalogConfig,
    pub custom_fields: CustomFieldTable,
    pub entity: EntityConfig,
    pub time_zone: Tz,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.eventadmin/eventadmin.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::resolve(cli, file_config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_db = file_config.database.unwrap_or_default();
        let file_catalog = file_config.catalog.unwrap_or_default();
        let file_custom = file_config.custom_fields.unwrap_or_default();
        let file_entity = file_config.entity.unwrap_or_default();
        let file_compiler = file_config.compiler.unwrap_or_default();

        let mysql = cli
            .mysql_url
            .clone()
            .or(file_db.url)
            .filter(|url| !url.trim().is_empty())
            .map(|url| MysqlConfig {
                url,
                max_connections: file_db
                    .max_connections
                    .unwrap_or(MYSQL_DEFAULT_MAX_CONNECTIONS),
                min_connections: file_db
                    .min_connections
                    .unwrap_or(MYSQL_DEFAULT_MIN_CONNECTIONS),
                acquire_timeout_secs: file_db
                    .acquire_timeout_secs
                    .unwrap_or(MYSQL_DEFAULT_ACQUIRE_TIMEOUT_SECS),
                idle_timeout_secs: file_db
                    .idle_timeout_secs
                    .unwrap_or(MYSQL_DEFAULT_IDLE_TIMEOUT_SECS),
            });

        let catalog = CatalogConfig {
            table: file_catalog
                .table
                .unwrap_or_else(|| DEFAULT_CATALOG_TABLE.to_string()),
            file: cli
                .catalog
                .as_ref()
                .map(|p| expand_path(&p.to_string_lossy()))
                .or_else(|| file_catalog.file.as_deref().map(expand_path)),
        };

        let defaults = CustomFieldTable::default();
        let custom_fields = CustomFieldTable {
            table: file_custom.table.unwrap_or(defaults.table),
            parent_key: file_custom.parent_key.unwrap_or(defaults.parent_key),
            key_column: file_custom.key_column.unwrap_or(defaults.key_column),
            field_column: file_custom.field_column.unwrap_or(defaults.field_column),
            text_column: file_custom.text_column.unwrap_or(defaults.text_column),
            list_column: file_custom.list_column.unwrap_or(defaults.list_column),
            boolean_column: file_custom.boolean_column.unwrap_or(defaults.boolean_column),
            numeric_column: file_custom.numeric_column.unwrap_or(defaults.numeric_column),
        };

        let entity = EntityConfig {
            table: file_entity
                .table
                .unwrap_or_else(|| DEFAULT_ENTITY_TABLE.to_string()),
            scope_column: file_entity
                .scope_column
                .unwrap_or_else(|| DEFAULT_ENTITY_SCOPE_COLUMN.to_string()),
            id_column: file_entity
                .id_column
                .unwrap_or_else(|| DEFAULT_ENTITY_ID_COLUMN.to_string()),
        };

        // compiler.time_zone: CLI/env overrides file config
        let time_zone = match cli.time_zone {
            Some(tz) => tz,
            None => {
                let name = file_compiler
                    .time_zone
                    .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
                parse_time_zone(&name).map_err(|e| anyhow::anyhow!("compiler.time_zone: {}", e))?
            }
        };

        let config = Self {
            mysql,
            catalog,
            custom_fields,
            entity,
            time_zone,
        };
        config.validate()?;

        tracing::debug!(
            mysql = config.mysql.is_some(),
            catalog_file = ?config.catalog.file,
            catalog_table = %config.catalog.table,
            time_zone = %config.time_zone,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reject values that would be unsafe or nonsensical at runtime
    fn validate(&self) -> Result<()> {
        let c = &self.custom_fields;
        let identifiers = [
            ("catalog.table", self.catalog.table.as_str()),
            ("custom_fields.table", c.table.as_str()),
            ("custom_fields.parent_key", c.parent_key.as_str()),
            ("custom_fields.key_column", c.key_column.as_str()),
            ("custom_fields.field_column", c.field_column.as_str()),
            ("custom_fields.text_column", c.text_column.as_str()),
            ("custom_fields.list_column", c.list_column.as_str()),
            ("custom_fields.boolean_column", c.boolean_column.as_str()),
            ("custom_fields.numeric_column", c.numeric_column.as_str()),
            ("entity.table", self.entity.table.as_str()),
            ("entity.scope_column", self.entity.scope_column.as_str()),
            ("entity.id_column", self.entity.id_column.as_str()),
        ];
        for (name, value) in identifiers {
            if !is_valid_identifier(value) {
                anyhow::bail!("{} must be a plain SQL identifier, got '{}'", name, value);
            }
        }

        if let Some(mysql) = &self.mysql
            && mysql.min_connections > mysql.max_connections
        {
            anyhow::bail!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                mysql.min_connections,
                mysql.max_connections
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.eventadmin/eventadmin.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
