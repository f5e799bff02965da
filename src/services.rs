pub mod snow_service;

pub use snow_service::SnowService;
