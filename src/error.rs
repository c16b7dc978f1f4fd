use thiserror::Error;

/// Failures reported by the popup manager.
///
/// None of these reach application code through the public API: the manager
/// logs them and treats the offending call as a no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PopupError {
    #[error("popup {0} not found")]
    PopupNotFound(String),
    #[error("popup template {0} not found")]
    TemplateNotFound(String),
    #[error("popup {0} has no .popup-container element")]
    MissingContainer(String),
}
