//! Shared test helpers for `batchline-core` integration tests.

#![allow(dead_code)]

pub mod transport;
