//! Data Transfer Objects for the Scrptly API
//!
//! Wire formats have drifted between service API versions (`contextImages`
//! vs `context`, `statusUrl` vs `eventsUrl`). This module is the one place
//! where both shapes are accepted and mapped onto the domain types.

pub mod job;
pub mod outcome;
