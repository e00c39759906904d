mod config;
pub use config::MySqlSourceConfig;

mod errors;
pub use errors::MySqlSourceError;

mod mysql;
pub use mysql::MySqlSource;
