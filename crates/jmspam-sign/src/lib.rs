#![forbid(unsafe_code)]

pub mod request;
pub mod signer;

pub use request::{RequestBuilder, RequestDescriptor, SIGNED_HEADERS};
pub use signer::{sign, SignError, SignatureToken};
