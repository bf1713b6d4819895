pub mod catalog;
pub mod error;
pub mod presets;
pub mod projects;
pub mod root;
