pub mod admin;
pub mod endpoint;
pub mod source;

pub use admin::{AdminClient, RefreshRequest};
pub use endpoint::{Endpoint, PositionsQuery};
pub use source::{HttpSource, JsonSource};
