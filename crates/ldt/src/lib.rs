//! LDTflow wire grammar (`ldt`)
//!
//! This is where lab-interchange text enters the LDTflow pipeline. We take the
//! raw delivery body, figure out which framing variant the sending gateway
//! used, and split it into structurally valid line records that downstream
//! stages can work with.
//!
//! ## What we do here
//!
//! - **Unwrap payloads** - Deliveries arrive as bare LDT text or as a JSON
//!   wrapper with the text embedded under one of a handful of keys
//! - **Detect framing** - Wrapped `<column1>…</column1>` segments or plain
//!   newline-delimited lines
//! - **Validate record headers** - 3-digit length, 4-digit record type, field
//!   id; anything structurally broken is dropped, never fatal
//! - **Sanitize content** - Strip markup-significant characters, normalize
//!   line endings, cap length
//!
//! ## Main entry points
//!
//! Call [`parse_message`] with decoded text and a [`ParserConfig`] to get the
//! ordered list of [`ParsedRecord`]s, or [`parse_message_strict`] when a
//! zero-record message should surface as an error. [`frame_line`] is the
//! reverse operation used by the wire-format generator: it produces one
//! outbound line in the exact framing the parser accepts, which is what makes
//! generated exports round-trip.
//!
//! ## Example
//!
//! ```
//! use ldt::{parse_message, ParserConfig};
//!
//! let cfg = ParserConfig::default();
//! let records = parse_message("01380007981Marburg\n0108221E\n", &cfg);
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].record_type, "8000");
//! assert_eq!(records[0].content, "Marburg");
//! ```

mod config;
mod error;
mod parser;
mod record;

pub use crate::config::ParserConfig;
pub use crate::error::LdtError;
pub use crate::parser::{parse_message, parse_message_strict, unwrap_payload};
pub use crate::record::{frame_line, ParsedRecord};
