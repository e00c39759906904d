use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to bind probe listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("probe server failed: {0}")]
    Serve(#[source] std::io::Error),
}
