//! Conversion between descriptors plus raw rows and stored tables.
//!
//! - [`caster`]: per-row casting, null-driven widening, and restoring stored
//!   rows back into descriptor order.
//! - [`builder`]: drains a row source into a keyed, typed [`Table`].
//! - [`reconstruct`]: infers a descriptor from an existing [`Table`].
//!
//! [`Table`]: crate::frame::Table

pub mod builder;
pub mod caster;
pub mod reconstruct;

pub use builder::build_table;
pub use caster::{CastRow, RestorePlan, RowLayout, Widening, cast_row, restore_value};
pub use reconstruct::restore_descriptor;
