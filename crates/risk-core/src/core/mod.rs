pub mod aggregator;
pub mod classifier;
pub mod data_service;
pub mod fetched;
pub mod gateway;
pub mod normalizer;
pub mod pagination;
pub mod scheduler;

pub use data_service::RiskDataService;
pub use fetched::Fetched;
pub use gateway::{FetchGateway, FetchOptions};
pub use scheduler::RefreshScheduler;
