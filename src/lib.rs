//! # LDTflow
//!
//! Umbrella crate for the LDT lab-interchange pipeline. It re-exports the
//! three processing stages and offers a one-call entry point for consumers
//! that just want identifiers out of a message:
//!
//! - [`ldt`] parses the line-record wire grammar into [`ldt::ParsedRecord`]s.
//! - [`extract`] runs the ordered identifier matchers over those records.
//! - [`routing`] matches the codes against a recipient directory, persists
//!   results, and serializes them back to the wire grammar.
//!
//! The HTTP delivery endpoint lives in the separate `ldtflow-server` crate;
//! this crate stays free of the async runtime so library consumers can embed
//! the pipeline anywhere.
//!
//! ```
//! use ldtflow::{parse_and_extract, ParserConfig};
//!
//! let message = "0180201793860200\n0180212772720053";
//! let (records, identifiers) = parse_and_extract(message, &ParserConfig::default()).unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(identifiers.facility_code.as_deref(), Some("793860200"));
//! ```

pub use extract::{
    detect_test_type, extract_identifiers, ExtractedIdentifiers, Patient,
};
pub use ldt::{
    frame_line, parse_message, parse_message_strict, unwrap_payload, LdtError, ParsedRecord,
    ParserConfig,
};
pub use routing::{
    build_result, generate_ldt, LabInfo, LabResult, Recipient, RecipientRole, ResultStatus,
    RoutingError,
};

use tracing::debug;

/// Errors from the combined parse-and-extract entry point.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] LdtError),
}

/// Parse a message and extract routing identifiers in one call.
///
/// Returns the structurally valid records alongside the extracted
/// identifiers. Fails only when the message yields zero valid records;
/// a message that parses but matches nothing still succeeds, with all
/// identifier fields unset.
pub fn parse_and_extract(
    text: &str,
    config: &ParserConfig,
) -> Result<(Vec<ParsedRecord>, ExtractedIdentifiers), PipelineError> {
    let records = parse_message_strict(text, config)?;
    let identifiers = extract_identifiers(&records);
    debug!(
        records = records.len(),
        has_routing_pair = identifiers.has_routing_pair(),
        "message parsed and extracted"
    );
    Ok((records, identifiers))
}
