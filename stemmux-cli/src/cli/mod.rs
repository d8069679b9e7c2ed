pub mod args;
pub mod mix;
