//! Shared test utilities

#![allow(dead_code)]

mod host;

pub use host::{Call, FakeHost, at};
