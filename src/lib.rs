pub mod auth;
pub mod config;
pub mod error;
pub mod hash;
pub mod models;
pub mod schema;
pub mod stats;
pub mod token;

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;
