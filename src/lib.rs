// CareCloud: child-safety content moderation for parents and guardians.
//
// This is the library root. Each module corresponds to a major subsystem
// of the moderation pipeline.

pub mod alerts;
pub mod analysis;
pub mod config;
pub mod db;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod status;

#[cfg(feature = "web")]
pub mod web;
