//! Common, shared types.

pub mod bounds;
pub mod clock;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
