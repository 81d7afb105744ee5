use thiserror::Error;

/// Recoverable failures surfaced while rewriting a file. None of them abort
/// the transform: the offending call is left as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HmrError {
    /// A router registration matched but its argument is not a literal
    /// require, nor an identifier bound to an import or require.
    #[error("can't get router path in {file}")]
    UnresolvedPath { file: String },

    /// The rendered hot-reload unit did not parse back.
    #[error("generated hot-reload source for {file} does not parse: {message}")]
    GeneratedSource { file: String, message: String },

    /// The plugin config is not valid JSON for [`crate::HmrConfig`].
    #[error("ignoring malformed plugin config: {message}")]
    MalformedConfig { message: String },
}
