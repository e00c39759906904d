use thiserror::Error;

#[derive(Error, Debug)]
pub enum MySqlSourceError {
    #[error("invalid database configuration: {0}")]
    Config(#[source] sqlx::Error),

    #[error("database not ready after {attempts} attempts: {last}")]
    NotReady {
        attempts: u32,
        #[source]
        last: sqlx::Error,
    },
}
