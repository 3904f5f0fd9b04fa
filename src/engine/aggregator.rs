use chrono::Utc;
use indexmap::IndexMap;
use log::warn;

use crate::findings::{
    CrossReferenceReport, JobParameterFindings, RepositoryParameterFindings, ScanReport,
    SkippedJob,
};

/// Accumulates per-job and per-repository findings for one scan invocation.
///
/// One instance is constructed per scan and passed explicitly; there is no
/// process-wide scan state. Jobs are deduplicated by name with last-write-
/// wins semantics, and every skipped entity is recorded so the final report
/// is never silently incomplete.
pub struct ResultAggregator {
    jenkins_url: Option<String>,
    target_parameters: Vec<String>,
    jobs: IndexMap<String, JobParameterFindings>,
    repositories: Vec<RepositoryParameterFindings>,
    skipped_jobs: Vec<SkippedJob>,
    warnings: Vec<String>,
}

impl ResultAggregator {
    pub fn new(jenkins_url: Option<&str>, target_parameters: &[String]) -> Self {
        Self {
            jenkins_url: jenkins_url.map(str::to_string),
            target_parameters: target_parameters.to_vec(),
            jobs: IndexMap::new(),
            repositories: Vec::new(),
            skipped_jobs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records one job's findings. A duplicate job name replaces the earlier
    /// entry and leaves a warning for caller visibility; it is not an error.
    pub fn record_job(&mut self, findings: JobParameterFindings) {
        if self.jobs.contains_key(&findings.job_name) {
            let message = format!(
                "Job '{}' was scanned more than once; keeping the most recent result",
                findings.job_name
            );
            warn!("{message}");
            self.warnings.push(message);
        }
        self.jobs.insert(findings.job_name.clone(), findings);
    }

    pub fn record_repository(&mut self, findings: RepositoryParameterFindings) {
        self.repositories.push(findings);
    }

    /// Records a job excluded from findings, with the reason. Absence of a
    /// job from the report must always be traceable to a skip entry.
    pub fn record_skipped(&mut self, job_name: &str, job_url: &str, reason: &str) {
        warn!("Skipping job '{job_name}': {reason}");
        self.skipped_jobs.push(SkippedJob {
            job_name: job_name.to_string(),
            job_url: job_url.to_string(),
            reason: reason.to_string(),
        });
    }

    /// All job findings recorded so far, in insertion order.
    pub fn jobs(&self) -> Vec<JobParameterFindings> {
        self.jobs.values().cloned().collect()
    }

    /// Seals the aggregate into the final immutable report.
    pub fn finish(self, cross_reference: CrossReferenceReport) -> ScanReport {
        let jobs: Vec<JobParameterFindings> = self.jobs.into_values().collect();
        ScanReport {
            jenkins_url: self.jenkins_url,
            scanned_at: Utc::now(),
            target_parameters: self.target_parameters,
            total_jobs: jobs.len() + self.skipped_jobs.len(),
            jobs,
            repositories: self.repositories,
            cross_reference,
            skipped_jobs: self.skipped_jobs,
            inactive_jobs: Vec::new(),
            warnings: self.warnings,
        }
    }
}
