//! Request specifications and their execution against the target API.
mod executor;
mod request;
mod template;


pub use executor::{HttpExecutor, RequestExecutor};
pub use request::{HttpMethod, RequestSpec};
