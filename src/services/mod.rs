pub mod fallback;
pub mod normalizer;
pub mod search;
