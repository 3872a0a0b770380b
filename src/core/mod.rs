pub mod aggregate;
pub mod config;
pub mod local_files;
pub mod params;
pub mod source;

#[cfg(test)]
mod config_test;

pub use aggregate::*;
pub use config::*;
pub use local_files::*;
pub use params::*;
pub use source::*;
