#![forbid(unsafe_code)]

pub mod errors;
pub mod query;
pub mod secret;
pub mod types;

pub use errors::QueryError;
pub use query::SecretQuery;
pub use secret::Secret;
pub use types::Operation;
