use crate::codegen::DEFAULT_CONTAINER;
use crate::error::HmrError;
use serde::Deserialize;

/// Plugin options, read from the host's JSON plugin config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HmrConfig {
    /// Suppress the notes and warnings reported to the host.
    pub quiet: bool,
    /// Selector the error overlay renders into.
    pub container: String,
    /// Omit model hot-reload blocks from the generated unit.
    pub disable_model: bool,
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            container: DEFAULT_CONTAINER.to_string(),
            disable_model: false,
        }
    }
}

impl HmrConfig {
    /// Parse the raw config string. Absent or blank input yields defaults;
    /// callers fall back to defaults on error too.
    pub fn from_json(raw: Option<&str>) -> Result<Self, HmrError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };
        serde_json::from_str::<HmrConfig>(raw).map_err(|err| {
            tracing::warn!("[dva-hmr] ignoring malformed plugin config: {err}");
            HmrError::MalformedConfig {
                message: err.to_string(),
            }
        })
    }

    pub fn enable_model(&self) -> bool {
        !self.disable_model
    }
}
