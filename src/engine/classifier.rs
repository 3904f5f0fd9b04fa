use crate::findings::JobKind;

use super::config_doc::ConfigDocument;

/// Which text source the parameter locator must run against for a job.
///
/// Adding a job kind requires a deliberate variant here; the match below is
/// exhaustive so a new kind cannot fall through silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionModel {
    /// The script text is embedded in the config and available immediately.
    InlineScript,
    /// The script must be resolved from a local repository checkout.
    RepositoryScript,
    /// No script to scan; only declared parameters from the config itself.
    ConfigOnly,
}

/// Total function over parsed config documents: `kind` was validated at
/// parse time, so classification cannot fail.
pub fn classify(doc: &ConfigDocument) -> ExecutionModel {
    match doc.kind {
        JobKind::InlineScriptPipeline => ExecutionModel::InlineScript,
        JobKind::SourceControlledPipeline => ExecutionModel::RepositoryScript,
        JobKind::FreeForm | JobKind::Unknown => ExecutionModel::ConfigOnly,
    }
}
