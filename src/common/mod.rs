//! Common, shared types.

pub mod error;
pub mod kinds;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
