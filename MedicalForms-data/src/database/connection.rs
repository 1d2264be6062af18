//! Database connection module for the MedicalForms service
//!
//! Supported backends:
//! - MongoDB (default)
//! - In-memory (tests and local runs without a server)
//!
//! The connection is created once at startup and handed to the repository;
//! nothing here is stored in process-wide state.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use mongodb::{options::ClientOptions, Client, Database};
use thiserror::Error;
use tracing::{error, info};

/// Application name reported to the MongoDB server
const APP_NAME: &str = "medical-forms";

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// MongoDB document store
    MongoDb,
    /// Process-local store, lost on restart
    Memory,
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(DatabaseType::MongoDb),
            "memory" | "in-memory" => Ok(DatabaseType::Memory),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Unsupported database type
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Invalid configuration value
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Driver failed to parse options or connect
    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[from] mongodb::error::Error),
}

/// Database configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Database type (mongodb, memory)
    pub db_type: DatabaseType,
    /// MongoDB connection string
    pub uri: String,
    /// Database name
    pub database: String,
    /// Collection holding the medical forms
    pub collection: String,
    /// Server selection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::MongoDb,
            uri: "mongodb://localhost:27017".to_string(),
            database: "medical_forms_db".to_string(),
            collection: "medical_forms".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_type = match lookup("DB_TYPE") {
            Some(value) => value.parse::<DatabaseType>()?,
            None => defaults.db_type,
        };

        let timeout_seconds = match lookup("DB_TIMEOUT_SECONDS") {
            Some(value) => value.parse::<u64>().map_err(|_| {
                DatabaseError::ConfigError(format!("DB_TIMEOUT_SECONDS must be a number, got '{}'", value))
            })?,
            None => defaults.timeout_seconds,
        };

        let config = Self {
            db_type,
            uri: lookup("MONGODB_URI").unwrap_or(defaults.uri),
            database: lookup("MONGODB_DATABASE").unwrap_or(defaults.database),
            collection: lookup("MONGODB_COLLECTION").unwrap_or(defaults.collection),
            timeout_seconds,
        };

        match config.db_type {
            DatabaseType::MongoDb => info!(
                "Database configuration: mongodb database={}, collection={}, timeout={}s",
                config.database, config.collection, config.timeout_seconds
            ),
            DatabaseType::Memory => info!("Database configuration: in-memory store"),
        }

        Ok(config)
    }
}

/// Open a MongoDB client and select the configured database.
///
/// The driver connects lazily, so this succeeds even if the server is down;
/// failures surface on the first operation.
pub async fn connect(config: &DatabaseConfig) -> Result<Database, DatabaseError> {
    let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
        error!("Invalid MongoDB connection string: {}", e);
        DatabaseError::from(e)
    })?;
    options.app_name = Some(APP_NAME.to_string());
    options.server_selection_timeout = Some(Duration::from_secs(config.timeout_seconds));

    let client = Client::with_options(options)?;
    info!("MongoDB client created for database {}", config.database);

    Ok(client.database(&config.database))
}
