pub mod handlers;
pub mod params;
pub mod serve;
pub mod state;
