//! Dependi Gradle - dependency extraction for Gradle builds
//!
//! This crate reads Gradle build scripts (Groovy and Kotlin DSL),
//! `gradle.properties` files and TOML version catalogs, and reports every
//! dependency and plugin they declare together with the exact byte offset of
//! its version text, so versions can be rewritten in place.

pub mod config;
pub mod extract;
pub mod file_types;
pub mod parsers;
pub mod reports;
pub mod update;
pub mod utils;
pub mod variables;
