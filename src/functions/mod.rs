pub mod strategy;

pub use strategy::{HoldTemplate, Strategy};
