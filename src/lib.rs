#[macro_use]
pub mod debug;

pub mod airbnb;
pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod collector;
pub mod export;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod region;
pub mod report;
pub mod source;
pub mod tui;
