pub mod cli;
pub mod config;
pub mod host;
pub mod script;
pub mod test_utils;

pub use rectbind_geometry::Rectangle;
