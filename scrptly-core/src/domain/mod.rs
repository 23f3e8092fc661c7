//! Core domain types
//!
//! This module contains the structures the lifecycle client reasons about.
//! They are independent of any particular service API version; the `dto`
//! module maps wire payloads into them.

pub mod job;
pub mod outcome;
