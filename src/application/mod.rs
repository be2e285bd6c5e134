//! Application services layer.

pub mod blog;
pub mod editor;
pub mod error;
pub mod render;
pub mod repos;
pub mod session;
pub mod syndication;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
