//! Param Cascade - a three-step parameter → worksheet → field configuration
//! resolver with drift-checked restore.
//!
//! This library provides the cascade engine, its persistence codec, and the
//! async facade that drives it against a live workbook.

pub mod cascade;
pub mod commands;
pub mod config;
pub mod effects;
pub mod facade;
pub mod persistence;
pub mod types;
pub mod workbook;

#[cfg(test)]
mod test_utils;
