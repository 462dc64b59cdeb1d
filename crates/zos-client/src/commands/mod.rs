pub mod auth;
pub mod console;
pub mod files;
pub mod jobs;
pub mod tso;
pub mod zosmf;
