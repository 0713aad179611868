pub mod coordinator;
pub mod student;
