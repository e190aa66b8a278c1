//! Rehearse - offline-first interview practice CLI
//!
//! This crate records timed answers to generated interview questions
//! and syncs them to a practice server whenever connectivity allows.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (capture, recognition, sync, storage)
//! - **CLI**: Command-line interface, argument parsing, and the session loop

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
