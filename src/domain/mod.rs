pub mod entities;
pub mod numbers;
