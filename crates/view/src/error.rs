use foundation::BasemapId;
use layers::StyleError;

/// Failure reported by a rendering backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("backend is not attached")]
    Detached,
    #[error("style is not loaded yet")]
    StyleNotLoaded,
    #[error("unknown layer `{0}`")]
    UnknownLayer(String),
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("layer `{layer}` rejected the change: {reason}")]
    Rejected { layer: String, reason: String },
    #[error("invalid style: {0}")]
    Style(String),
    #[error("{0}")]
    Host(String),
}

impl From<StyleError> for BackendError {
    fn from(e: StyleError) -> Self {
        BackendError::Style(e.to_string())
    }
}

/// User-facing failure kinds of the view transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("3D view needs an access token; configure one to enable buildings")]
    Configuration,
    #[error("no usable map backend: {0}")]
    BackendUnavailable(String),
    #[error("could not update layer `{layer}`: {source}")]
    LayerMutation {
        layer: String,
        #[source]
        source: BackendError,
    },
    #[error("could not read the camera of {basemap}: {source}")]
    CaptureFailure {
        basemap: BasemapId,
        #[source]
        source: BackendError,
    },
}

impl ViewError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        ViewError::BackendUnavailable(detail.into())
    }
}
