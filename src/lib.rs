pub mod activity;
pub mod config;
pub mod demo;
pub mod error;
pub mod logging;
pub mod model;
pub mod reminders;
pub mod scheduler;
pub mod service;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod theme;
pub mod ui;

pub use error::{FlowError, FlowResult};
pub use service::FlowSync;
