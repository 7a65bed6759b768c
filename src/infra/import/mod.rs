pub mod csv;
pub mod file_check;
