//! # LDTflow Routing (`routing`)
//!
//! ## Purpose
//!
//! `routing` turns extracted identifiers into routed result records. It owns
//! the domain entities, the collaborator abstractions (recipient directory,
//! result repository, raw-message store), the result builder that performs
//! the pipeline's only write, and the reverse-path wire-format generator.
//!
//! In a typical deployment you will:
//! - Use `ldt` + `extract` to turn an accepted delivery into
//!   [`extract::ExtractedIdentifiers`].
//! - Call [`build_result`] to match the codes against the directory and
//!   append exactly one [`LabResult`] per accepted message.
//! - Call [`generate_ldt`] to serialize result records back into the wire
//!   grammar for export.
//!
//! ## Store abstractions
//!
//! [`RecipientDirectory`], [`ResultRepository`], and [`RawMessageStore`] are
//! traits with in-memory implementations. Production deployments swap in a
//! real datastore behind the same interfaces; the in-memory variants keep
//! the pipeline fully testable without wall-clock or I/O dependencies.

mod builder;
mod directory;
mod error;
mod export;
mod repository;
mod types;

pub use crate::builder::{build_result, patient_display_name, RoutedResult};
pub use crate::directory::{InMemoryRecipientDirectory, RecipientDirectory};
pub use crate::error::RoutingError;
pub use crate::export::{generate_ldt, LabInfo};
pub use crate::repository::{
    InMemoryRawMessageStore, InMemoryResultRepository, RawMessageStore, ResultRepository,
};
pub use crate::types::{LabResult, RawMessage, Recipient, RecipientRole, ResultStatus};
