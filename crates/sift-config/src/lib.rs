pub mod annotations;
pub mod config;
pub mod entity;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
