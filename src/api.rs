pub mod identity;
pub mod todo;
pub mod user;
