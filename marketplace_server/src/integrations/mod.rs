//! Hooks that connect engine events to other parts of the marketplace.
pub mod analytics;
