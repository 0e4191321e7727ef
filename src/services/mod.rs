pub mod burndown;
pub mod charts;
pub mod summary;
