use std::thread;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::{info, warn};
use thiserror::Error;

use crate::Pool;

static POSTGRES_USER: &str = "POSTGRES_USER";
static POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
static POSTGRES_HOST: &str = "POSTGRES_HOST";
static POSTGRES_DB: &str = "POSTGRES_DB";
static JWT_SECRET: &str = "JWT_SECRET";

pub const DB_MAX_RETRIES: u32 = 10;
pub const DB_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("could not connect to the database after {0} attempts")]
    DatabaseUnavailable(u32),
}

/// Everything a request handler needs, built once at startup and cloned into
/// the server factory. Replaces process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub token_secret: String,
}

pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub name: String,
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

impl DbConfig {
    pub fn from_env() -> Result<DbConfig, ConfigError> {
        Ok(DbConfig {
            user: require_var(POSTGRES_USER)?,
            password: require_var(POSTGRES_PASSWORD)?,
            host: require_var(POSTGRES_HOST)?,
            name: require_var(POSTGRES_DB)?,
        })
    }

    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:5432/{}",
            self.user, self.password, self.host, self.name
        )
    }
}

/// The symmetric token secret shared by the auth and game services.
pub fn token_secret_from_env() -> Result<String, ConfigError> {
    require_var(JWT_SECRET)
}

/// Build the connection pool, retrying a bounded number of times before
/// giving up on startup. This is the only retry policy in the system.
pub fn connect_with_retry(config: &DbConfig) -> Result<Pool, ConfigError> {
    let url = config.url();
    for attempt in 1..=DB_MAX_RETRIES {
        let manager = ConnectionManager::<PgConnection>::new(url.clone());
        match r2d2::Pool::builder().build(manager) {
            Ok(pool) => {
                info!("Successfully connected to the database");
                return Ok(pool);
            }
            Err(e) => {
                warn!(
                    "Failed to connect to DB (attempt {}/{}): {}",
                    attempt, DB_MAX_RETRIES, e
                );
                if attempt < DB_MAX_RETRIES {
                    thread::sleep(DB_RETRY_DELAY);
                }
            }
        }
    }
    Err(ConfigError::DatabaseUnavailable(DB_MAX_RETRIES))
}

/// CORS policy for the browser frontend. The game service reads the bearer
/// token out of the Authorization header, so it must be allowed through.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_database_url() {
        let config = DbConfig {
            user: "panda".to_string(),
            password: "bamboo".to_string(),
            host: "db".to_string(),
            name: "games".to_string(),
        };
        assert_eq!(config.url(), "postgresql://panda:bamboo@db:5432/games");
    }

    #[test]
    fn test_missing_var_is_an_error() {
        // Uses a name nothing else reads so the test never has to mutate the
        // process environment.
        let err = require_var("ARCADE_VAR_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar("ARCADE_VAR_THAT_IS_NEVER_SET")
        ));
    }
}
