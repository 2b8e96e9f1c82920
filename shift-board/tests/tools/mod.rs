#![allow(dead_code)]

pub mod fixtures;
pub mod flaky_store;
