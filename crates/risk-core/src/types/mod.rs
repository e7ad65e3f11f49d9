pub mod alert;
pub mod liquidation;
pub mod market;
pub mod position;
pub mod protocol;
pub mod resource;
pub mod risk;
pub mod summary;
pub mod time;

pub use alert::*;
pub use liquidation::*;
pub use market::*;
pub use position::*;
pub use protocol::*;
pub use resource::*;
pub use risk::*;
pub use summary::*;
pub use time::*;
