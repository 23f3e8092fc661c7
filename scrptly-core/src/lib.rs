//! Scrptly Core
//!
//! Core types for the Scrptly video generation client.
//!
//! This crate contains:
//! - Domain types: the job a caller asks for, the handle the service hands
//!   back, status snapshots and terminal outcomes
//! - DTOs: wire formats for the generation API, including the mapping between
//!   the field names used by different service API versions

pub mod domain;
pub mod dto;
