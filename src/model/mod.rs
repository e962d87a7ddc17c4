pub mod policy;
pub mod records;
pub mod tables;
