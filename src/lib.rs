pub mod clean;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod linkage;
pub mod normalize;
pub mod types;
