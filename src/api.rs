//! HTTP handlers. Each one loads what it needs through the store, hands the
//! snapshot to [`crate::progress`] and wraps the answer in an `ApiResponse`.

pub mod coordinator;
pub mod student;

mod helper;
