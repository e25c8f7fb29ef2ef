pub mod book;
pub mod student;
pub mod transaction;
