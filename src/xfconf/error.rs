use thiserror::Error;

/// Everything that can go wrong while loading, editing, or committing a
/// channel document. Structural errors abort before commit, so the on-disk
/// file is only ever touched by a successful atomic replace.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("property path not found: {0}")]
    PathNotFound(String),

    #[error("channel document is malformed: {0}")]
    Malformed(String),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to read channel document: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write channel document: {0}")]
    WriteFailure(#[source] std::io::Error),
}
