#![doc = include_str!("../README.md")]

pub mod backtrace;
pub mod config;
pub mod dedup;
pub mod error;
pub mod monitor;
pub mod processor;
pub mod tailer;
pub mod taxonomy;

pub use backtrace::{BacktraceFragment, BacktraceParser};
pub use config::{MonitorConfig, MonitorConfigBuilder, WatchTarget};
pub use dedup::ReplayFilter;
pub use error::MonitorError;
pub use monitor::{LogMonitor, LogMonitorBuilder};
pub use processor::LineProcessor;
pub use tailer::{FileTailer, TailedLine};
pub use taxonomy::{Classification, Classifier, EventDefinition, SeverityAdjuster};
