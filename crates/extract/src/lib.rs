//! # LDTflow Identifier Extractor (`extract`)
//!
//! ## Purpose
//!
//! `extract` sits between the wire grammar (`ldt`) and the routing layer
//! (`routing`). It walks the parsed records of one message through a fixed,
//! ordered set of heuristic matchers and recovers the two routing
//! identifiers plus patient demographics:
//!
//! - **Facility code** - 9-digit site identifier
//! - **Practitioner code** - 7-digit practitioner identifier (9-digit
//!   national numbers carry a 2-digit specialty suffix, which is dropped)
//! - **Patient** - last name, first name, birth date, gender
//!
//! Every field is optional; a message that yields nothing is a valid
//! outcome, not an error. The routing layer queues such results for manual
//! review instead of rejecting the delivery.
//!
//! ## Matcher ordering
//!
//! Matchers run in a fixed order and a later matcher's value for the same
//! logical field overwrites an earlier one (last-write-wins across the
//! order). This is deliberately conservative: feeds in the wild disagree on
//! which encoding is authoritative, and the fixed order makes the outcome
//! reproducible rather than dependent on record arrangement. The bare-value
//! fallback is the exception: it only ever fills fields that are still
//! unset.
//!
//! ## Core API
//!
//! - [`extract_identifiers`]: run the full matcher pipeline over a message
//! - [`detect_test_type`]: recover the test designation for result labeling
//! - [`ExtractedIdentifiers`], [`Patient`]: the recovered data

mod matchers;
mod types;

pub use crate::matchers::{detect_test_type, extract_identifiers};
pub use crate::types::{ExtractedIdentifiers, Patient};
