pub mod item;
pub mod rule;
pub mod transaction;
