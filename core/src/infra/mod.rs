//! Infrastructure layer - storage and external services

pub mod blob;
pub mod db;
pub mod event_log;
pub mod sequencer;
