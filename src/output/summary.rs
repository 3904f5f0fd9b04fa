use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::findings::{MismatchKind, ResolutionStatus, ScanReport};

use super::styling::{accent, alert, emphasis, heading, muted, notice, ok};
use super::tables::{create_cyan_header, create_table, kind_cell, presence_cell, status_cell};

/// Prints a human-readable summary of a scan report to stdout.
///
/// Displays color-coded tables showing:
/// - Overview: controller URL, job counts, repositories, target parameters
/// - Parameter Findings: per target parameter, every job it was found in
/// - Repositories: local checkouts and the pipeline files scanned in them
/// - Cross-Reference: unresolved jobs, orphan repositories, and mismatches
/// - Skipped Jobs: jobs excluded from findings, with reasons
pub fn print_summary(report: &ScanReport) {
    println!("{}", render_summary(report));
}

// Helper functions

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", emphasis(emoji), heading(title));
}

fn mismatch_label(kind: MismatchKind) -> &'static str {
    match kind {
        MismatchKind::DeclaredButUnused => "declared but never used",
        MismatchKind::UsedButUndeclared => "used but never declared",
    }
}

#[allow(clippy::too_many_lines, clippy::format_push_string)]
fn render_summary(report: &ScanReport) -> String {
    let mut output = String::new();

    // Overview section
    add_section_header(&mut output, "📊", "Overview");

    let source = report
        .jenkins_url
        .as_deref()
        .unwrap_or("local config files");

    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        muted("Source:"),
        accent(source),
        muted("Jobs discovered:"),
        notice(report.total_jobs),
        muted("Jobs scanned:"),
        notice(report.jobs.len()),
        muted("Local repositories:"),
        notice(report.repositories.len()),
        muted("Target parameters:"),
        accent(report.target_parameters.join(", ")),
        muted("Scan date:"),
        muted(report.scanned_at.format("%Y-%m-%d %H:%M UTC"))
    ));

    if report.jobs.is_empty() && report.repositories.is_empty() {
        output.push_str(&format!("{}\n", notice("No jobs or repositories scanned.")));
        return output;
    }

    // Parameter Findings
    for parameter in &report.target_parameters {
        add_section_header(&mut output, "🔎", &format!("Parameter: {parameter}"));

        let found = report.jobs_with_parameter(parameter);
        let defined = report.jobs_defining_parameter(parameter);
        let used_only = report.jobs_using_parameter_only(parameter);

        output.push_str(&format!(
            "  {} {}   {} {}   {} {}\n",
            muted("Found in jobs:"),
            notice(found),
            muted("Declared:"),
            notice(defined),
            muted("Used without declaration:"),
            if used_only > 0 {
                alert(used_only)
            } else {
                ok(used_only)
            }
        ));

        if found == 0 {
            output.push_str(&format!(
                "  {}\n\n",
                muted("Not found in any scanned job.")
            ));
            continue;
        }

        let mut table = create_table();
        table.set_header(create_cyan_header(&[
            "Job",
            "Kind",
            "Resolution",
            "Defined",
            "Used",
            "Occurrences",
        ]));

        for job in &report.jobs {
            let Some(finding) = job.parameters.get(parameter) else {
                continue;
            };
            if !finding.found() {
                continue;
            }
            let evidence = job.resolution_status == ResolutionStatus::Resolved;
            table.add_row(vec![
                Cell::new(&job.job_name),
                kind_cell(job.kind),
                status_cell(job.resolution_status),
                presence_cell(finding.defined_as_parameter, true),
                presence_cell(finding.used_in_script, evidence),
                Cell::new(finding.occurrences.len()),
            ]);
        }

        output.push_str(&format!("{table}\n\n"));
    }

    // Repositories
    if !report.repositories.is_empty() {
        add_section_header(&mut output, "📁", "Local Repositories");

        let mut table = create_table();
        table.set_header(create_cyan_header(&[
            "Repository",
            "Pipeline Files",
            "Parameters Found",
        ]));

        for repo in &report.repositories {
            let found: Vec<&str> = repo
                .parameters
                .iter()
                .filter(|(_, finding)| finding.found())
                .map(|(name, _)| name.as_str())
                .collect();
            let found_cell = if found.is_empty() {
                Cell::new("none").fg(TableColor::DarkGrey)
            } else {
                Cell::new(found.join(", ")).fg(TableColor::Green)
            };
            table.add_row(vec![
                Cell::new(&repo.repository),
                Cell::new(repo.scanned_files.join("\n")),
                found_cell,
            ]);
        }

        output.push_str(&format!("{table}\n\n"));
    }

    // Cross-Reference
    let cross = &report.cross_reference;
    add_section_header(&mut output, "🔗", "Cross-Reference");

    if cross.jobs_missing_repository.is_empty()
        && cross.repositories_without_job.is_empty()
        && cross.parameter_mismatches.is_empty()
    {
        output.push_str(&format!(
            "  {}\n\n",
            ok("Jobs and repositories are consistent.")
        ));
    } else {
        for job in &cross.jobs_missing_repository {
            output.push_str(&format!(
                "  {} Job {} references a repository with no local checkout\n",
                alert("✗"),
                accent(job)
            ));
        }
        for repo in &cross.repositories_without_job {
            output.push_str(&format!(
                "  {} Repository {} is not referenced by any scanned job\n",
                notice("•"),
                accent(repo)
            ));
        }

        if !cross.parameter_mismatches.is_empty() {
            let mut table = create_table();
            table.set_header(create_cyan_header(&["Parameter", "Job", "Issue"]));
            for mismatch in &cross.parameter_mismatches {
                table.add_row(vec![
                    Cell::new(&mismatch.parameter_name),
                    Cell::new(&mismatch.job_name),
                    Cell::new(mismatch_label(mismatch.kind)).fg(TableColor::Red),
                ]);
            }
            output.push_str(&format!("{table}\n"));
        }
        output.push('\n');
    }

    // Inactive Jobs
    if !report.inactive_jobs.is_empty() {
        add_section_header(&mut output, "💤", "Inactive Jobs");

        let mut table = create_table();
        table.set_header(create_cyan_header(&["Job", "Last Built", "Days Idle"]));
        for job in &report.inactive_jobs {
            let (last_built, days_idle) = match (job.last_built_at, job.days_idle) {
                (Some(at), Some(days)) => (
                    Cell::new(at.format("%Y-%m-%d")),
                    Cell::new(days).fg(TableColor::Yellow),
                ),
                _ => (
                    Cell::new("never built").fg(TableColor::Red),
                    Cell::new("-").fg(TableColor::DarkGrey),
                ),
            };
            table.add_row(vec![Cell::new(&job.job_name), last_built, days_idle]);
        }
        output.push_str(&format!("{table}\n\n"));
    }

    // Skipped Jobs
    if !report.skipped_jobs.is_empty() {
        add_section_header(&mut output, "⚠️", "Skipped Jobs");

        let mut table = create_table();
        table.set_header(create_cyan_header(&["Job", "Reason"]));
        for skipped in &report.skipped_jobs {
            table.add_row(vec![
                Cell::new(&skipped.job_name),
                Cell::new(&skipped.reason).fg(TableColor::Yellow),
            ]);
        }
        output.push_str(&format!("{table}\n\n"));
    }

    for warning in &report.warnings {
        output.push_str(&format!("  {} {}\n", notice("!"), warning));
    }
    if !report.warnings.is_empty() {
        output.push('\n');
    }

    // Next Steps
    add_section_header(&mut output, "💡", "Next Steps");
    output.push_str(&format!(
        "  {} Use {} for the full report with per-line occurrences\n\
         \x20 {} Fix undeclared usages first - they break when defaults are assumed\n\
         \x20 {} Remove declared-but-unused parameters to reduce config noise\n",
        accent("•"),
        notice("--format json"),
        accent("•"),
        accent("•")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{
        CrossReferenceReport, InactiveJob, JobKind, JobParameterFindings, ParameterFinding,
        ParameterMismatch, RepositoryParameterFindings, SkippedJob,
    };
    use chrono::{Duration, Utc};
    use indexmap::IndexMap;

    fn finding(defined: bool, used: bool) -> ParameterFinding {
        ParameterFinding {
            defined_as_parameter: defined,
            used_in_script: used,
            occurrences: Vec::new(),
        }
    }

    fn report_with(
        jobs: Vec<JobParameterFindings>,
        repositories: Vec<RepositoryParameterFindings>,
        cross_reference: CrossReferenceReport,
    ) -> ScanReport {
        let total_jobs = jobs.len();
        ScanReport {
            jenkins_url: Some("https://ci.example.com/".to_string()),
            scanned_at: Utc::now(),
            target_parameters: vec!["ECR_PATH".to_string()],
            total_jobs,
            jobs,
            repositories,
            cross_reference,
            skipped_jobs: Vec::new(),
            inactive_jobs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn job(name: &str, defined: bool, used: bool) -> JobParameterFindings {
        let mut parameters = IndexMap::new();
        parameters.insert("ECR_PATH".to_string(), finding(defined, used));
        JobParameterFindings {
            job_name: name.to_string(),
            job_url: format!("https://ci.example.com/job/{name}/"),
            kind: JobKind::InlineScriptPipeline,
            resolution_status: ResolutionStatus::Resolved,
            resolved_repository: None,
            parameters,
        }
    }

    #[test]
    fn test_render_summary_empty_report() {
        let report = report_with(vec![], vec![], CrossReferenceReport::default());
        let output = render_summary(&report);

        assert!(output.contains("https://ci.example.com/"));
        assert!(output.contains("ECR_PATH"));
        assert!(output.contains("No jobs or repositories scanned"));
    }

    #[test]
    fn test_render_summary_lists_jobs_where_parameter_was_found() {
        let report = report_with(
            vec![job("uses-it", false, true), job("without-it", false, false)],
            vec![],
            CrossReferenceReport::default(),
        );
        let output = render_summary(&report);

        assert!(output.contains("Parameter: ECR_PATH"));
        assert!(output.contains("uses-it"));
        assert!(!output.contains("without-it"));
        assert!(output.contains("Next Steps"));
    }

    #[test]
    fn test_render_summary_shows_mismatches() {
        let cross = CrossReferenceReport {
            jobs_missing_repository: vec!["lost-job".to_string()],
            repositories_without_job: vec!["orphan-repo".to_string()],
            parameter_mismatches: vec![ParameterMismatch {
                parameter_name: "ECR_PATH".to_string(),
                job_name: "stale-job".to_string(),
                kind: MismatchKind::DeclaredButUnused,
            }],
        };
        let report = report_with(vec![job("stale-job", true, false)], vec![], cross);
        let output = render_summary(&report);

        assert!(output.contains("lost-job"));
        assert!(output.contains("orphan-repo"));
        assert!(output.contains("declared but never used"));
    }

    #[test]
    fn test_render_summary_shows_skipped_jobs() {
        let mut report = report_with(vec![], vec![], CrossReferenceReport::default());
        report.skipped_jobs.push(SkippedJob {
            job_name: "broken".to_string(),
            job_url: "https://ci.example.com/job/broken/".to_string(),
            reason: "could not fetch config".to_string(),
        });
        report.repositories.push(RepositoryParameterFindings {
            repository: "app1".to_string(),
            scanned_files: vec!["Jenkinsfile".to_string()],
            parameters: IndexMap::new(),
        });
        let output = render_summary(&report);

        assert!(output.contains("Skipped Jobs"));
        assert!(output.contains("broken"));
        assert!(output.contains("could not fetch config"));
        assert!(output.contains("app1"));
    }

    #[test]
    fn test_render_summary_shows_inactive_jobs() {
        let mut report = report_with(
            vec![job("dormant", false, true)],
            vec![],
            CrossReferenceReport::default(),
        );
        report.inactive_jobs = vec![
            InactiveJob {
                job_name: "abandoned".to_string(),
                job_url: "https://ci.example.com/job/abandoned/".to_string(),
                last_built_at: None,
                days_idle: None,
            },
            InactiveJob {
                job_name: "dormant".to_string(),
                job_url: "https://ci.example.com/job/dormant/".to_string(),
                last_built_at: Some(Utc::now() - Duration::days(200)),
                days_idle: Some(200),
            },
        ];
        let output = render_summary(&report);

        assert!(output.contains("Inactive Jobs"));
        assert!(output.contains("abandoned"));
        assert!(output.contains("never built"));
        assert!(output.contains("200"));
    }
}
