pub mod cli;
pub mod config;
pub mod key;
pub mod policy;
pub mod report;
pub mod scan;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod util;
