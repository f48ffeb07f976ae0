// Shared helpers for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

pub mod capture;
pub mod faults;
pub mod testroot;

pub use capture::Capture;
pub use faults::{FaultyOpener, Faults};
pub use testroot::TestRoot;
