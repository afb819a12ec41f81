use serde::{Deserialize, Serialize};

/// Parser configuration.
///
/// Serde-friendly so it can be embedded in the server configuration and
/// overridden per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Restrict record types to the hardened numeric range [8000, 8599].
    ///
    /// Off by default: the identifier matchers rely on record types outside
    /// that range (`0201`, `0212`, the bare patient types), so this only
    /// makes sense for feeds known to emit exclusively 8xxx blocks.
    #[serde(default)]
    pub strict_record_types: bool,

    /// Maximum retained content length per record, in characters.
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_record_types: false,
            max_content_len: default_max_content_len(),
        }
    }
}

fn default_max_content_len() -> usize {
    500
}
