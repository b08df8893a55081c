pub mod dir;
pub mod file;
pub mod segment;
