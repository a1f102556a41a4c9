pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_service;
