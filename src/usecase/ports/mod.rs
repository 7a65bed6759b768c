pub mod backend;
pub mod notify;
