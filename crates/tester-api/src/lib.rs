mod error;
pub use error::ProbeError;

mod http;
pub use http::{ProbeApi, serve};
