use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Execution model of a Jenkins job, derived from its config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Pipeline with the Groovy script embedded in the job config.
    InlineScriptPipeline,
    /// Pipeline whose script lives in a source-controlled file.
    SourceControlledPipeline,
    /// Freestyle or Maven job built from configured build steps.
    FreeForm,
    /// Anything the parser does not recognize.
    Unknown,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::InlineScriptPipeline => "inline pipeline",
            Self::SourceControlledPipeline => "scm pipeline",
            Self::FreeForm => "freestyle",
            Self::Unknown => "unknown",
        }
    }
}

/// Whether a job's script text could be located for scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    /// All text sources for this job were available and scanned.
    Resolved,
    /// The repository was found but the pipeline script file was not,
    /// or no repository root was supplied for an SCM job.
    ScriptUnavailable,
    /// No local repository directory matched the job's SCM reference.
    RepositoryNotFoundLocally,
}

/// How a single occurrence of a target parameter was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccurrenceKind {
    /// The line declares the parameter with a default value.
    DeclaredAsJobParameter,
    /// The line references the parameter in script text.
    UsedInScriptText,
}

/// The text source an occurrence was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccurrenceOrigin {
    InlineJobScript,
    RepositoryFile,
}

/// One textual match of a target parameter.
///
/// `line_number` is 1-based and refers to the exact text that was scanned.
/// `line_context` is the trimmed source line and never spans multiple lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOccurrence {
    pub parameter_name: String,
    pub kind: OccurrenceKind,
    pub line_number: usize,
    pub line_context: String,
    pub origin: OccurrenceOrigin,
    /// Job name for inline scripts, repository-relative file path otherwise.
    pub origin_identifier: String,
}

/// Per-parameter verdict for one job or repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFinding {
    pub defined_as_parameter: bool,
    pub used_in_script: bool,
    pub occurrences: Vec<ParameterOccurrence>,
}

impl ParameterFinding {
    pub fn found(&self) -> bool {
        self.defined_as_parameter || self.used_in_script
    }
}

/// Aggregated findings for a single Jenkins job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParameterFindings {
    pub job_name: String,
    pub job_url: String,
    pub kind: JobKind,
    pub resolution_status: ResolutionStatus,
    /// Local repository directory this job's SCM reference resolved to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_repository: Option<String>,
    /// Keyed by target parameter name, in the caller-supplied order.
    pub parameters: IndexMap<String, ParameterFinding>,
}

/// Aggregated findings for a single local repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryParameterFindings {
    pub repository: String,
    /// Pipeline definition files that were scanned, repository-relative.
    pub scanned_files: Vec<String>,
    pub parameters: IndexMap<String, ParameterFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchKind {
    DeclaredButUnused,
    UsedButUndeclared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMismatch {
    pub parameter_name: String,
    pub job_name: String,
    pub kind: MismatchKind,
}

/// Derived comparison between the job set and the local repository set.
///
/// Holds nothing that is not traceable to a job or repository finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossReferenceReport {
    /// SCM jobs whose reference did not resolve to a local repository.
    pub jobs_missing_repository: Vec<String>,
    /// Local repositories no job's SCM reference resolved to.
    pub repositories_without_job: Vec<String>,
    pub parameter_mismatches: Vec<ParameterMismatch>,
}

/// A job that was excluded from findings, with the reason why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedJob {
    pub job_name: String,
    pub job_url: String,
    pub reason: String,
}

/// A job whose last build is older than the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactiveJob {
    pub job_name: String,
    pub job_url: String,
    /// `None` when the job has never been built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_built_at: Option<DateTime<Utc>>,
    /// Whole days since the last build; `None` when never built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_idle: Option<i64>,
}

/// Complete, immutable result of one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jenkins_url: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub target_parameters: Vec<String>,
    pub total_jobs: usize,
    pub jobs: Vec<JobParameterFindings>,
    pub repositories: Vec<RepositoryParameterFindings>,
    pub cross_reference: CrossReferenceReport,
    pub skipped_jobs: Vec<SkippedJob>,
    /// Populated only when an inactivity threshold was requested.
    #[serde(default)]
    pub inactive_jobs: Vec<InactiveJob>,
    pub warnings: Vec<String>,
}

impl ScanReport {
    /// Number of jobs in which `parameter` was found at all.
    pub fn jobs_with_parameter(&self, parameter: &str) -> usize {
        self.jobs
            .iter()
            .filter(|job| {
                job.parameters
                    .get(parameter)
                    .is_some_and(ParameterFinding::found)
            })
            .count()
    }

    /// Number of jobs declaring `parameter` as a job input.
    pub fn jobs_defining_parameter(&self, parameter: &str) -> usize {
        self.jobs
            .iter()
            .filter(|job| {
                job.parameters
                    .get(parameter)
                    .is_some_and(|f| f.defined_as_parameter)
            })
            .count()
    }

    /// Number of jobs using `parameter` in script text without declaring it.
    pub fn jobs_using_parameter_only(&self, parameter: &str) -> usize {
        self.jobs
            .iter()
            .filter(|job| {
                job.parameters
                    .get(parameter)
                    .is_some_and(|f| f.used_in_script && !f.defined_as_parameter)
            })
            .count()
    }
}
