pub mod content;
pub mod coordinator;
pub mod profile;
pub mod records;
pub mod student;
