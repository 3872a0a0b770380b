pub mod app;
pub mod form;
pub mod list;
pub mod list_row;


pub use app::*;
