//! Core application

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::{AppConfig, EntityConfig};
use crate::core::constants::{APP_NAME_LOWER, DEFAULT_ID_LIMIT, DEFAULT_LOG_FILTER, ENV_LOG};
use crate::data::filters::{CompiledQuery, FilterService, SqlValue, parse_filter_json};
use crate::data::mysql::repositories::reservation::{self, EntityTarget};
use crate::data::{FieldCatalog, MysqlFieldCatalog, MysqlService, StaticFieldCatalog};
use crate::utils::file::expand_path;
use crate::utils::sql::is_valid_identifier;

/// JSON printed by `filterc compile`
#[derive(Debug, Serialize)]
struct CompileOutput<'a> {
    scope_id: i64,
    predicate: &'a str,
    where_clause: String,
    joins: &'a [String],
    params: &'a [SqlValue],
}

impl<'a> CompileOutput<'a> {
    fn new(scope_id: i64, query: &'a CompiledQuery) -> Self {
        Self {
            scope_id,
            predicate: &query.predicate,
            where_clause: query.where_clause(),
            joins: &query.joins,
            params: &query.params.values,
        }
    }
}

pub struct CoreApp {
    pub config: AppConfig,
    pub filters: FilterService,
    pub mysql: Option<MysqlService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config, command.needs_database()).await?;
        let result = app.execute(&cli_config, command).await;
        app.shutdown().await;
        result
    }

    async fn init(cli: &CliConfig, needs_database: bool) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let use_mysql = needs_database || config.catalog.file.is_none();
        let mysql = match (&config.mysql, use_mysql) {
            (Some(mysql_config), true) => Some(
                MysqlService::init(mysql_config)
                    .await
                    .context("Failed to initialize MySQL")?,
            ),
            (None, true) if needs_database => {
                anyhow::bail!("This command needs a MySQL URL (--mysql-url or database.url)")
            }
            _ => None,
        };

        let catalog: Arc<dyn FieldCatalog> = match (&config.catalog.file, &mysql) {
            (Some(path), _) => Arc::new(StaticFieldCatalog::load(path).with_context(|| {
                format!("Failed to load field catalog: {}", path.display())
            })?),
            (None, Some(db)) => Arc::new(MysqlFieldCatalog::new(
                db.pool().clone(),
                config.catalog.table.clone(),
            )),
            (None, None) => anyhow::bail!(
                "No field catalog available: pass --catalog <file> or configure a MySQL URL"
            ),
        };
        tracing::debug!(backend = catalog.backend_name(), "Field catalog initialized");

        let filters = FilterService::new(catalog, config.custom_fields.clone(), config.time_zone);

        Ok(Self {
            config,
            filters,
            mysql,
        })
    }

    async fn execute(&self, cli: &CliConfig, command: Commands) -> Result<()> {
        match command {
            Commands::Compile { filter } => {
                let scope_id = cli.scope.unwrap_or(0);
                let query = compile_filter(&self.filters, scope_id, &filter).await?;
                print_json(&CompileOutput::new(scope_id, &query))
            }
            Commands::Count { filter, from } => {
                let scope_id = require_scope(cli)?;
                let (entity, filters) = self.entity_for(from.as_deref())?;
                let query = compile_filter(&filters, scope_id, &filter).await?;
                let count = reservation::count_filtered(
                    self.pool()?,
                    target(&entity),
                    scope_id,
                    &query,
                )
                .await
                .context("Count query failed")?;
                print_json(&serde_json::json!({ "scope_id": scope_id, "count": count }))
            }
            Commands::Ids {
                filter,
                from,
                limit,
            } => {
                let scope_id = require_scope(cli)?;
                let (entity, filters) = self.entity_for(from.as_deref())?;
                let query = compile_filter(&filters, scope_id, &filter).await?;
                let ids = reservation::list_filtered_ids(
                    self.pool()?,
                    target(&entity),
                    &entity.id_column,
                    scope_id,
                    &query,
                    limit.unwrap_or(DEFAULT_ID_LIMIT),
                )
                .await
                .context("Id query failed")?;
                print_json(&serde_json::json!({ "scope_id": scope_id, "ids": ids }))
            }
        }
    }

    fn pool(&self) -> Result<&crate::data::mysql::MySqlPool> {
        self.mysql
            .as_ref()
            .map(MysqlService::pool)
            .context("MySQL is not configured")
    }

    /// Entity layout and filter service for `--from`
    ///
    /// Columns qualified by the configured entity table, including the custom
    /// field parent key, are moved onto the chosen table.
    fn entity_for(&self, from: Option<&str>) -> Result<(EntityConfig, FilterService)> {
        let configured = &self.config.entity;
        let Some(table) = from.filter(|table| *table != configured.table) else {
            return Ok((configured.clone(), self.filters.clone()));
        };
        if !is_valid_identifier(table) {
            anyhow::bail!("--from must be a plain table name, got '{}'", table);
        }

        let entity = configured.retarget(table);
        let custom_fields = self
            .config
            .custom_fields
            .for_parent_table(&configured.table, table);
        tracing::debug!(
            table,
            scope_column = %entity.scope_column,
            id_column = %entity.id_column,
            parent_key = %custom_fields.parent_key,
            "Retargeted entity table"
        );
        Ok((entity, self.filters.with_custom_fields(custom_fields)))
    }

    async fn shutdown(&self) {
        if let Some(mysql) = &self.mysql {
            mysql.close().await;
        }
    }

    fn init_logging() {
        let default_filter = format!("{},{}={}", DEFAULT_LOG_FILTER, APP_NAME_LOWER, DEFAULT_LOG_FILTER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries the JSON result, logs go to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

async fn compile_filter(filters: &FilterService, scope_id: i64, filter_arg: &str) -> Result<CompiledQuery> {
    let wire = read_filter_arg(filter_arg)?;
    filters.compile(scope_id, &wire).await.map_err(|e| {
        tracing::debug!(code = e.code(), error = %e, "Filter compilation failed");
        anyhow::Error::new(e).context("Failed to compile filter")
    })
}

fn target(entity: &EntityConfig) -> EntityTarget<'_> {
    EntityTarget {
        table: &entity.table,
        scope_column: &entity.scope_column,
    }
}

fn require_scope(cli: &CliConfig) -> Result<i64> {
    cli.scope
        .context("This command needs --scope (or EVENTADMIN_SCOPE)")
}

/// Inline filter JSON, or `@path` to read it from a file
fn read_filter_arg(arg: &str) -> Result<Value> {
    let arg = arg.trim();
    let json = match arg.strip_prefix('@') {
        Some(path) => {
            let path = expand_path(path);
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read filter file: {}", path.display()))?
        }
        None => arg.to_string(),
    };
    parse_filter_json(&json).context("Invalid filter JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
