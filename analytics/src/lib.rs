pub mod queries;
pub mod warehouse;
