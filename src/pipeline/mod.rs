pub mod batch;
pub mod driver;
pub mod external;
pub mod formats;
pub mod fs_ops;
pub mod normalize;
pub mod runner;
