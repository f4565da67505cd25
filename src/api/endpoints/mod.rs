pub mod analyze;
pub mod artifacts;
pub mod download;
pub mod job;
pub mod preview;
pub mod process;
pub mod status;
pub mod upload;
