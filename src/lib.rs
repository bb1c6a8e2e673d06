// Library exports for xenorip

pub mod config;
pub mod event;
pub mod pipeline;

// Re-export commonly used types from pipeline
pub use config::RipConfig;
pub use event::{EventSink, RipEvent};
pub use pipeline::{
    driver::PipelineDriver,
    formats,
    normalize::DirectoryNormalizer,
    runner::BatchJobRunner,
};
