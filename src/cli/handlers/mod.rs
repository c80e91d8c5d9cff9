pub mod build;
pub mod check;
pub mod commons;
pub mod plan;
pub mod show;
pub mod tree;
