pub mod jobs;
pub mod tables;
