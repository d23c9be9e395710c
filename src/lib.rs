//! regex-harness - build harness for the syspro.tm.RegexApp module
//!
//! Resolves the application dependency through a freshness-aware cache,
//! then runs the module, its test suite, or its benchmarks under one shared
//! set of JVM flags that grants native access to the entry module.

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod harness;
pub mod module;
pub mod resolver;
pub mod testing;
