use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use log::info;

use crate::engine::Scan;
use crate::error::Result;
use crate::findings::{InactiveJob, ScanReport};
use crate::output::PhaseProgress;

use super::client::JenkinsClient;
use super::types::JenkinsJob;

/// Drives a full scan against a live Jenkins controller: list jobs, fetch
/// configs concurrently, feed the engine.
pub struct JenkinsScanner {
    client: JenkinsClient,
    concurrency: usize,
}

impl JenkinsScanner {
    pub fn new(client: JenkinsClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs the scan. Config fetches run `concurrency` at a time but results
    /// are consumed in job-listing order, so report ordering does not depend
    /// on response timing.
    ///
    /// A job whose config cannot be fetched is recorded as skipped; only the
    /// initial job listing is allowed to fail the scan.
    pub async fn scan(
        &self,
        targets: &[String],
        repositories_root: Option<&Path>,
        inactive_after_days: Option<u64>,
    ) -> Result<ScanReport> {
        // Input contract checks run before any network traffic.
        let mut scan = Scan::new(Some(self.client.base_url()), targets, repositories_root)?;

        let progress = PhaseProgress::start_phase_1();
        let jobs = self.client.list_jobs().await?;
        info!("Found {} scannable jobs", jobs.len());

        let inactive_jobs = inactive_after_days
            .map(|days| find_inactive_jobs(&jobs, days, Utc::now()))
            .unwrap_or_default();

        let progress = progress.finish_phase_1_start_phase_2();
        let fetched: Vec<_> = stream::iter(jobs.into_iter().map(|job| {
            let client = self.client.clone();
            async move {
                let result = client.fetch_job_config(&job.url).await;
                (job, result)
            }
        }))
        .buffered(self.concurrency)
        .collect()
        .await;

        let progress = progress.finish_phase_2_start_phase_3();
        for (job, result) in fetched {
            match result {
                Ok(raw) => scan.process_config(&job.name, &job.url, &raw),
                Err(e) => scan.record_unavailable_job(
                    &job.name,
                    &job.url,
                    &format!("could not fetch config: {e}"),
                ),
            }
        }

        let mut report = scan.finish()?;
        report.inactive_jobs = inactive_jobs;
        progress.finish_phase_3();
        Ok(report)
    }
}

/// Jobs whose last build started more than `threshold_days` ago, as of `now`.
///
/// Never-built jobs are always inactive once a threshold is requested, and
/// sort ahead of everything else; the rest sort most stale first, with the
/// job name as a tiebreak.
pub fn find_inactive_jobs(
    jobs: &[JenkinsJob],
    threshold_days: u64,
    now: DateTime<Utc>,
) -> Vec<InactiveJob> {
    let threshold_days = i64::try_from(threshold_days).unwrap_or(i64::MAX);
    let mut inactive: Vec<InactiveJob> = jobs
        .iter()
        .filter_map(|job| {
            let last_built_at = job
                .last_build
                .as_ref()
                .and_then(|build| Utc.timestamp_millis_opt(build.timestamp).single());
            let days_idle = last_built_at.map(|at| (now - at).num_days());
            match days_idle {
                Some(days) if days <= threshold_days => None,
                _ => Some(InactiveJob {
                    job_name: job.name.clone(),
                    job_url: job.url.clone(),
                    last_built_at,
                    days_idle,
                }),
            }
        })
        .collect();

    inactive.sort_by(|a, b| match (a.days_idle, b.days_idle) {
        (None, None) => a.job_name.cmp(&b.job_name),
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.job_name.cmp(&b.job_name)),
    });
    inactive
}
