use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::findings::{MismatchKind, ResolutionStatus, ScanReport};

/// Exports a scan report to various formats.
///
/// Supports multiple output formats for different use cases:
/// - CSV: Spreadsheet analysis and reporting
/// - HTML: Self-contained reports with formatting
/// - JSON: Programmatic access (already supported)
/// - Summary: Human-readable terminal output (already supported)
pub fn export_report(
    report: &ScanReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            // Summary format is handled separately in cli.rs
            unreachable!("Summary format should be handled in CLI")
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_csv(report, output),
        OutputFormat::Html => export_html(report, output),
    }
}

fn export_json(report: &ScanReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn status_label(status: ResolutionStatus) -> &'static str {
    match status {
        ResolutionStatus::Resolved => "resolved",
        ResolutionStatus::ScriptUnavailable => "script unavailable",
        ResolutionStatus::RepositoryNotFoundLocally => "repository not found",
    }
}

/// Quotes one CSV field, doubling any embedded quotes per RFC 4180.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn export_csv(report: &ScanReport, output: &mut dyn Write) -> Result<()> {
    // Job section: one row per job, three columns per target parameter
    let mut header = "Job,URL,Kind,Resolution,Repository".to_string();
    for parameter in &report.target_parameters {
        header.push_str(&format!(
            ",{parameter} Defined,{parameter} Used,{parameter} Occurrences"
        ));
    }
    writeln!(output, "{header}")?;

    for job in &report.jobs {
        let mut row = format!(
            "{},{},{},{},{}",
            csv_field(&job.job_name),
            csv_field(&job.job_url),
            job.kind.label(),
            status_label(job.resolution_status),
            job.resolved_repository.as_deref().unwrap_or("")
        );
        for parameter in &report.target_parameters {
            match job.parameters.get(parameter) {
                Some(finding) => row.push_str(&format!(
                    ",{},{},{}",
                    finding.defined_as_parameter,
                    finding.used_in_script,
                    finding.occurrences.len()
                )),
                None => row.push_str(",false,false,0"),
            }
        }
        writeln!(output, "{row}")?;
    }

    // Repository section
    writeln!(output)?;
    let mut header = "Repository,Pipeline Files".to_string();
    for parameter in &report.target_parameters {
        header.push_str(&format!(",{parameter} Found"));
    }
    writeln!(output, "{header}")?;

    for repo in &report.repositories {
        let mut row = format!(
            "{},{}",
            csv_field(&repo.repository),
            csv_field(&repo.scanned_files.join("; "))
        );
        for parameter in &report.target_parameters {
            let found = repo
                .parameters
                .get(parameter)
                .is_some_and(crate::findings::ParameterFinding::found);
            row.push_str(&format!(",{found}"));
        }
        writeln!(output, "{row}")?;
    }

    // Mismatch section
    writeln!(output)?;
    writeln!(output, "Parameter,Job,Issue")?;
    for mismatch in &report.cross_reference.parameter_mismatches {
        let issue = match mismatch.kind {
            MismatchKind::DeclaredButUnused => "declared but never used",
            MismatchKind::UsedButUndeclared => "used but never declared",
        };
        writeln!(
            output,
            "{},{},{}",
            csv_field(&mismatch.parameter_name),
            csv_field(&mismatch.job_name),
            issue
        )?;
    }

    // Inactive job section, present only when a threshold was requested
    if !report.inactive_jobs.is_empty() {
        writeln!(output)?;
        writeln!(output, "Inactive Job,URL,Last Built,Days Idle")?;
        for job in &report.inactive_jobs {
            let last_built = job
                .last_built_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string());
            let days_idle = job
                .days_idle
                .map(|days| days.to_string())
                .unwrap_or_default();
            writeln!(
                output,
                "{},{},{last_built},{days_idle}",
                csv_field(&job.job_name),
                csv_field(&job.job_url)
            )?;
        }
    }

    Ok(())
}

fn export_html(report: &ScanReport, output: &mut dyn Write) -> Result<()> {
    let source = report
        .jenkins_url
        .as_deref()
        .unwrap_or("local config files");

    writeln!(output, "<!DOCTYPE html>")?;
    writeln!(output, "<html lang=\"en\">")?;
    writeln!(output, "<head>")?;
    writeln!(output, "    <meta charset=\"UTF-8\">")?;
    writeln!(output, "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(output, "    <title>JobLens Report - {source}</title>")?;
    writeln!(output, "    <style>")?;
    writeln!(output, "        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }}")?;
    writeln!(output, "        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}")?;
    writeln!(output, "        h1 {{ color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }}")?;
    writeln!(output, "        h2 {{ color: #34495e; margin-top: 30px; }}")?;
    writeln!(output, "        .summary {{ background: #ecf0f1; padding: 20px; border-radius: 5px; margin: 20px 0; }}")?;
    writeln!(output, "        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}")?;
    writeln!(output, "        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }}")?;
    writeln!(output, "        th {{ background: #3498db; color: white; }}")?;
    writeln!(output, "        tr:nth-child(even) {{ background: #f8f9fa; }}")?;
    writeln!(output, "        .good {{ color: #27ae60; }}")?;
    writeln!(output, "        .warning {{ color: #f39c12; }}")?;
    writeln!(output, "        .bad {{ color: #e74c3c; }}")?;
    writeln!(output, "    </style>")?;
    writeln!(output, "</head>")?;
    writeln!(output, "<body>")?;
    writeln!(output, "    <div class=\"container\">")?;
    writeln!(output, "        <h1>🔎 JobLens Parameter Audit Report</h1>")?;
    writeln!(output, "        <div class=\"summary\">")?;
    writeln!(output, "            <h2>Scan Summary</h2>")?;
    writeln!(output, "            <p><strong>Source:</strong> {source}</p>")?;
    writeln!(output, "            <p><strong>Scan Date:</strong> {}</p>", report.scanned_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(output, "            <p><strong>Jobs Discovered:</strong> {}</p>", report.total_jobs)?;
    writeln!(output, "            <p><strong>Jobs Scanned:</strong> {}</p>", report.jobs.len())?;
    writeln!(output, "            <p><strong>Target Parameters:</strong> {}</p>", report.target_parameters.join(", "))?;
    writeln!(output, "        </div>")?;

    // Jobs table
    writeln!(output, "        <h2>Jobs</h2>")?;
    writeln!(output, "        <table>")?;
    writeln!(output, "            <thead>")?;
    writeln!(output, "                <tr>")?;
    writeln!(output, "                    <th>Job</th>")?;
    writeln!(output, "                    <th>Kind</th>")?;
    writeln!(output, "                    <th>Resolution</th>")?;
    for parameter in &report.target_parameters {
        writeln!(output, "                    <th>{parameter}</th>")?;
    }
    writeln!(output, "                </tr>")?;
    writeln!(output, "            </thead>")?;
    writeln!(output, "            <tbody>")?;

    for job in &report.jobs {
        let status_class = match job.resolution_status {
            ResolutionStatus::Resolved => "good",
            ResolutionStatus::ScriptUnavailable => "warning",
            ResolutionStatus::RepositoryNotFoundLocally => "bad",
        };
        writeln!(output, "                <tr>")?;
        writeln!(output, "                    <td><a href=\"{}\">{}</a></td>", job.job_url, job.job_name)?;
        writeln!(output, "                    <td>{}</td>", job.kind.label())?;
        writeln!(output, "                    <td class=\"{status_class}\">{}</td>", status_label(job.resolution_status))?;
        for parameter in &report.target_parameters {
            let cell = match job.parameters.get(parameter) {
                Some(f) if f.defined_as_parameter && f.used_in_script => {
                    "<span class=\"good\">defined + used</span>".to_string()
                }
                Some(f) if f.defined_as_parameter => {
                    "<span class=\"warning\">defined only</span>".to_string()
                }
                Some(f) if f.used_in_script => {
                    "<span class=\"warning\">used only</span>".to_string()
                }
                _ => "-".to_string(),
            };
            writeln!(output, "                    <td>{cell}</td>")?;
        }
        writeln!(output, "                </tr>")?;
    }
    writeln!(output, "            </tbody>")?;
    writeln!(output, "        </table>")?;

    // Mismatches table
    if !report.cross_reference.parameter_mismatches.is_empty() {
        writeln!(output, "        <h2>Parameter Mismatches</h2>")?;
        writeln!(output, "        <table>")?;
        writeln!(output, "            <thead>")?;
        writeln!(output, "                <tr>")?;
        writeln!(output, "                    <th>Parameter</th>")?;
        writeln!(output, "                    <th>Job</th>")?;
        writeln!(output, "                    <th>Issue</th>")?;
        writeln!(output, "                </tr>")?;
        writeln!(output, "            </thead>")?;
        writeln!(output, "            <tbody>")?;
        for mismatch in &report.cross_reference.parameter_mismatches {
            let issue = match mismatch.kind {
                MismatchKind::DeclaredButUnused => "declared but never used",
                MismatchKind::UsedButUndeclared => "used but never declared",
            };
            writeln!(output, "                <tr>")?;
            writeln!(output, "                    <td>{}</td>", mismatch.parameter_name)?;
            writeln!(output, "                    <td>{}</td>", mismatch.job_name)?;
            writeln!(output, "                    <td class=\"bad\">{issue}</td>")?;
            writeln!(output, "                </tr>")?;
        }
        writeln!(output, "            </tbody>")?;
        writeln!(output, "        </table>")?;
    }

    // Inactive jobs table
    if !report.inactive_jobs.is_empty() {
        writeln!(output, "        <h2>Inactive Jobs</h2>")?;
        writeln!(output, "        <table>")?;
        writeln!(output, "            <thead>")?;
        writeln!(output, "                <tr>")?;
        writeln!(output, "                    <th>Job</th>")?;
        writeln!(output, "                    <th>Last Built</th>")?;
        writeln!(output, "                    <th>Days Idle</th>")?;
        writeln!(output, "                </tr>")?;
        writeln!(output, "            </thead>")?;
        writeln!(output, "            <tbody>")?;
        for job in &report.inactive_jobs {
            writeln!(output, "                <tr>")?;
            writeln!(output, "                    <td><a href=\"{}\">{}</a></td>", job.job_url, job.job_name)?;
            match (job.last_built_at, job.days_idle) {
                (Some(at), Some(days)) => {
                    writeln!(output, "                    <td>{}</td>", at.format("%Y-%m-%d"))?;
                    writeln!(output, "                    <td class=\"warning\">{days}</td>")?;
                }
                _ => {
                    writeln!(output, "                    <td class=\"bad\">never built</td>")?;
                    writeln!(output, "                    <td>-</td>")?;
                }
            }
            writeln!(output, "                </tr>")?;
        }
        writeln!(output, "            </tbody>")?;
        writeln!(output, "        </table>")?;
    }

    writeln!(output, "        <footer style=\"margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; text-align: center;\">")?;
    writeln!(output, "            <p>Report generated by JobLens v{} on {}</p>", env!("CARGO_PKG_VERSION"), report.scanned_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(output, "        </footer>")?;
    writeln!(output, "    </div>")?;
    writeln!(output, "</body>")?;
    writeln!(output, "</html>")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{
        CrossReferenceReport, InactiveJob, JobKind, JobParameterFindings, ParameterFinding,
        ParameterMismatch,
    };
    use chrono::Utc;
    use indexmap::IndexMap;

    fn create_test_report() -> ScanReport {
        let mut parameters = IndexMap::new();
        parameters.insert(
            "ECR_PATH".to_string(),
            ParameterFinding {
                defined_as_parameter: true,
                used_in_script: false,
                occurrences: Vec::new(),
            },
        );

        let job = JobParameterFindings {
            job_name: "app1-deploy".to_string(),
            job_url: "https://ci.example.com/job/app1-deploy/".to_string(),
            kind: JobKind::SourceControlledPipeline,
            resolution_status: ResolutionStatus::Resolved,
            resolved_repository: Some("app1".to_string()),
            parameters,
        };

        ScanReport {
            jenkins_url: Some("https://ci.example.com/".to_string()),
            scanned_at: Utc::now(),
            target_parameters: vec!["ECR_PATH".to_string()],
            total_jobs: 1,
            jobs: vec![job],
            repositories: Vec::new(),
            cross_reference: CrossReferenceReport {
                jobs_missing_repository: Vec::new(),
                repositories_without_job: Vec::new(),
                parameter_mismatches: vec![ParameterMismatch {
                    parameter_name: "ECR_PATH".to_string(),
                    job_name: "app1-deploy".to_string(),
                    kind: MismatchKind::DeclaredButUnused,
                }],
            },
            skipped_jobs: Vec::new(),
            inactive_jobs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_export_json() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_json(&report, false, &mut output).unwrap();
        let json_str = String::from_utf8(output).unwrap();
        assert!(json_str.contains("app1-deploy"));
        assert!(json_str.contains("ECR_PATH"));
        assert!(json_str.contains("DeclaredButUnused"));
    }

    #[test]
    fn test_export_json_pretty() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_json(&report, true, &mut output).unwrap();
        let json_str = String::from_utf8(output).unwrap();
        assert!(json_str.contains('\n'));
        assert!(json_str.contains("  "));
    }

    #[test]
    fn test_export_csv_columns_per_parameter() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_csv(&report, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert!(csv.contains("ECR_PATH Defined,ECR_PATH Used,ECR_PATH Occurrences"));
        assert!(csv.contains("\"app1-deploy\""));
        assert!(csv.contains("true,false,0"));
        assert!(csv.contains("declared but never used"));
    }

    #[test]
    fn test_export_csv_escapes_embedded_quotes() {
        let mut report = create_test_report();
        report.jobs[0].job_name = "deploy \"prod\"".to_string();

        let mut output = Vec::new();
        export_csv(&report, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert!(csv.contains("\"deploy \"\"prod\"\"\""));
    }

    #[test]
    fn test_export_csv_inactive_job_section() {
        let mut report = create_test_report();
        report.inactive_jobs = vec![InactiveJob {
            job_name: "abandoned".to_string(),
            job_url: "https://ci.example.com/job/abandoned/".to_string(),
            last_built_at: None,
            days_idle: None,
        }];

        let mut output = Vec::new();
        export_csv(&report, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert!(csv.contains("Inactive Job,URL,Last Built,Days Idle"));
        assert!(csv.contains("\"abandoned\",\"https://ci.example.com/job/abandoned/\",never,"));
    }

    #[test]
    fn test_export_html_structure() {
        let report = create_test_report();
        let mut output = Vec::new();
        export_html(&report, &mut output).unwrap();
        let html = String::from_utf8(output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("</html>"));
        assert!(html.contains("JobLens"));
        assert!(html.contains("app1-deploy"));
        assert!(html.contains("Parameter Mismatches"));
    }
}
