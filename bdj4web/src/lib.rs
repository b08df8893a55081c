//! BDJ4 web endpoints
//!
//! Server side of the BallroomDJ 4 desktop client: the mobile marquee relay,
//! support file uploads, the connectivity test and the install report.

pub mod app;
pub mod authn;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod marquee;
pub mod report;
pub mod server;
pub mod storage;
pub mod tester;
pub mod upload;
pub mod utils;
