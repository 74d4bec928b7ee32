//! Proptest strategies for casematrix property-based testing
//!
//! Reusable strategies for generating matrix rows and scenario groups
//! across all casematrix crates.

pub mod strategies;

pub use strategies::{
    RowSpec, build_group, strategy_label, strategy_row_specs, strategy_scalar_value,
    strategy_template,
};
