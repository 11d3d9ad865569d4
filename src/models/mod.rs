pub mod file;
pub mod log;

pub use file::*;
pub use log::*;
