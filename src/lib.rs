use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod frontier;
pub mod heap_primitives;
pub mod node;

// Search space and problems
// -------------------------
pub mod cost;
pub mod float_cost;
pub mod space;

// Problems
// --------
pub mod problems;

// Algorithms
// ----------
pub mod algorithms;
pub mod explain;
pub mod trace;

#[cfg(test)]
mod test_utils;
