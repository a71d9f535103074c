//! Optimization of logic networks

mod rewrite;

pub use rewrite::{rewrite, RewriteParameters};
