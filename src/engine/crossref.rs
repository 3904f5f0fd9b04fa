use crate::findings::{
    CrossReferenceReport, JobKind, JobParameterFindings, MismatchKind, ParameterMismatch,
    ResolutionStatus,
};

/// Joins per-job findings against the set of local repositories.
///
/// Runs only after all per-job and per-repository findings are complete;
/// everything it reports is traceable to a finding entry, never derived from
/// hidden state.
pub fn cross_reference(
    jobs: &[JobParameterFindings],
    known_repositories: &[String],
) -> CrossReferenceReport {
    let jobs_missing_repository = jobs
        .iter()
        .filter(|job| {
            job.kind == JobKind::SourceControlledPipeline
                && job.resolution_status != ResolutionStatus::Resolved
        })
        .map(|job| job.job_name.clone())
        .collect();

    let repositories_without_job = known_repositories
        .iter()
        .filter(|repository| {
            !jobs
                .iter()
                .any(|job| job.resolved_repository.as_deref() == Some(repository.as_str()))
        })
        .cloned()
        .collect();

    CrossReferenceReport {
        jobs_missing_repository,
        repositories_without_job,
        parameter_mismatches: detect_mismatches(jobs),
    }
}

/// Mismatch detection is confidence-gated: only jobs whose script text was
/// actually read can prove a parameter unused. Unresolved jobs and jobs
/// without a script (freestyle, unknown) are excluded so a parameter whose
/// usage site was never scanned is reported as unknown, not as unused.
fn detect_mismatches(jobs: &[JobParameterFindings]) -> Vec<ParameterMismatch> {
    let mut mismatches = Vec::new();

    for job in jobs {
        if job.resolution_status != ResolutionStatus::Resolved {
            continue;
        }
        if !matches!(
            job.kind,
            JobKind::InlineScriptPipeline | JobKind::SourceControlledPipeline
        ) {
            continue;
        }

        for (name, finding) in &job.parameters {
            let kind = match (finding.defined_as_parameter, finding.used_in_script) {
                (true, false) => MismatchKind::DeclaredButUnused,
                (false, true) => MismatchKind::UsedButUndeclared,
                _ => continue,
            };
            mismatches.push(ParameterMismatch {
                parameter_name: name.clone(),
                job_name: job.job_name.clone(),
                kind,
            });
        }
    }

    mismatches
}
