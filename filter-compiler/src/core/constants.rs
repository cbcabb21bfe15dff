// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "eventadmin";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".eventadmin";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "eventadmin.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "EVENTADMIN_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "EVENTADMIN_LOG";

// =============================================================================
// Environment Variables - Compilation
// =============================================================================

/// Environment variable for the MySQL connection URL
pub const ENV_MYSQL_URL: &str = "EVENTADMIN_MYSQL_URL";

/// Environment variable for the scope (project) id
pub const ENV_SCOPE: &str = "EVENTADMIN_SCOPE";

/// Environment variable for the compiler time zone
pub const ENV_TIME_ZONE: &str = "EVENTADMIN_TIME_ZONE";

/// Environment variable for an offline catalog file
pub const ENV_CATALOG_FILE: &str = "EVENTADMIN_CATALOG_FILE";

// =============================================================================
// MySQL Defaults
// =============================================================================

/// Default max connections in the pool
pub const MYSQL_DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default connections kept warm
pub const MYSQL_DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Default connection acquire timeout in seconds
pub const MYSQL_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds (10 minutes)
pub const MYSQL_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// Catalog and Entity Defaults
// =============================================================================

/// Default field catalog table
pub const DEFAULT_CATALOG_TABLE: &str = "fields";

/// Default filtered entity table
pub const DEFAULT_ENTITY_TABLE: &str = "reservations";

/// Default scope column of the entity table
pub const DEFAULT_ENTITY_SCOPE_COLUMN: &str = "reservations.project_id";

/// Default id column of the entity table
pub const DEFAULT_ENTITY_ID_COLUMN: &str = "reservations.reservation_id";

/// Default number of ids listed by `filterc ids`
pub const DEFAULT_ID_LIMIT: u32 = 100;

// =============================================================================
// Custom Field Table Defaults
// =============================================================================

pub const DEFAULT_CUSTOM_FIELD_TABLE: &str = "custom_field_values";
pub const DEFAULT_CUSTOM_FIELD_PARENT_KEY: &str = "reservations.reservation_id";
pub const DEFAULT_CUSTOM_FIELD_KEY_COLUMN: &str = "reservation_id";
pub const DEFAULT_CUSTOM_FIELD_FIELD_COLUMN: &str = "field_id";
pub const DEFAULT_CUSTOM_FIELD_TEXT_COLUMN: &str = "value_text";
pub const DEFAULT_CUSTOM_FIELD_LIST_COLUMN: &str = "value_list";
pub const DEFAULT_CUSTOM_FIELD_BOOLEAN_COLUMN: &str = "value_bool";
pub const DEFAULT_CUSTOM_FIELD_NUMERIC_COLUMN: &str = "value_number";

// =============================================================================
// Compiler Defaults
// =============================================================================

/// Default IANA time zone for date literals and "start of today"
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Default log filter when neither EVENTADMIN_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info";
