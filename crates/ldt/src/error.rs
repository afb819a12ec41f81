use thiserror::Error;

/// Errors surfaced by the strict parsing entry point.
///
/// Per-record structural failures are never errors; malformed lines are
/// dropped individually so one noisy line cannot discard a whole batch. Only
/// a message that produces nothing at all is worth reporting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LdtError {
    /// The delivery body decoded to an empty or whitespace-only string.
    #[error("message body is empty")]
    EmptyMessage,

    /// Every line in the message failed structural validation.
    #[error("no structurally valid records in message")]
    NoValidRecords,
}
