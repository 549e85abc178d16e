// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "SensorHub";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "sensorhub";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".sensorhub";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "sensorhub.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SENSORHUB_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "SENSORHUB_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "SENSORHUB_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SENSORHUB_LOG";

/// Environment variable for the static dashboard directory
pub const ENV_STATIC_DIR: &str = "SENSORHUB_STATIC_DIR";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "SENSORHUB_DATA_DIR";

/// Environment variable to override the SQLite database file
pub const ENV_DB_FILE: &str = "SENSORHUB_DB_FILE";

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database filename (inside the sqlite data subdirectory)
pub const SQLITE_DB_FILENAME: &str = "sensorhub.db";

/// Maximum pooled connections (WAL allows concurrent readers with one writer)
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout before a locked statement fails
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Pool acquire timeout before an operation fails with a connection error
pub const SQLITE_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

/// WAL auto-checkpoint threshold in pages
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval between explicit WAL checkpoints
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Query Defaults
// =============================================================================

/// Default row count for recent-readings queries
pub const DEFAULT_RECENT_LIMIT: u32 = 100;

/// Default statistics window in hours
pub const DEFAULT_STATISTICS_HOURS: u32 = 24;

/// Default retention age in days for manual cleanup
pub const DEFAULT_CLEANUP_DAYS: u32 = 30;

// =============================================================================
// Retention
// =============================================================================

/// Environment variable for automatic retention age in days
pub const ENV_RETENTION_DAYS: &str = "SENSORHUB_RETENTION_DAYS";

/// Interval between automatic retention runs
pub const RETENTION_INTERVAL_SECS: u64 = 3600;

// =============================================================================
// Message Channel Topics
// =============================================================================

/// Environment variables for sensor topic names
pub const ENV_TOPIC_TEMPERATURE: &str = "SENSORHUB_TOPIC_TEMPERATURE";
pub const ENV_TOPIC_HUMIDITY: &str = "SENSORHUB_TOPIC_HUMIDITY";
pub const ENV_TOPIC_AIR_QUALITY: &str = "SENSORHUB_TOPIC_AIR_QUALITY";
pub const ENV_TOPIC_STATUS: &str = "SENSORHUB_TOPIC_STATUS";

/// Default sensor topic names
pub const DEFAULT_TOPIC_TEMPERATURE: &str = "iot/sensor/temperature";
pub const DEFAULT_TOPIC_HUMIDITY: &str = "iot/sensor/humidity";
pub const DEFAULT_TOPIC_AIR_QUALITY: &str = "iot/sensor/airquality";
pub const DEFAULT_TOPIC_STATUS: &str = "iot/device/status";

/// Environment variable for the correlation merge policy
pub const ENV_MERGE_POLICY: &str = "SENSORHUB_MERGE_POLICY";

/// In-process topic carrying raw sensor messages
pub const TOPIC_SENSOR_MESSAGES: &str = "sensor_messages";

/// Environment variables for topic buffer tuning
pub const ENV_TOPIC_BUFFER_SIZE: &str = "SENSORHUB_TOPIC_BUFFER_SIZE";
pub const ENV_TOPIC_CHANNEL_CAPACITY: &str = "SENSORHUB_TOPIC_CHANNEL_CAPACITY";

/// Default topic buffer size in bytes
pub const DEFAULT_TOPIC_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Default topic channel capacity in messages
pub const DEFAULT_TOPIC_CHANNEL_CAPACITY: usize = 10_000;

// =============================================================================
// HTTP
// =============================================================================

/// Default request body limit
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Maximum payload accepted by the publish bridge
pub const PUBLISH_BODY_LIMIT: usize = 4 * 1024;

/// Retry-After value returned when the message channel is saturated
pub const BACKPRESSURE_RETRY_AFTER_SECS: u64 = 1;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
