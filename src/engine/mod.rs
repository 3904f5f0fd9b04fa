//! The job classification + parameter correlation engine.
//!
//! A pure, synchronous transformation stage: every input (raw config text,
//! repository file text) is materialized in memory before it is handed in,
//! and nothing here performs network I/O. The fetch and report layers are
//! collaborators on either side.

pub mod aggregator;
pub mod classifier;
pub mod config_doc;
pub mod crossref;
pub mod locator;
pub mod repository;

use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::error::{JobLensError, Result};
use crate::findings::{
    JobParameterFindings, OccurrenceOrigin, ParameterFinding, ParameterOccurrence,
    RepositoryParameterFindings, ResolutionStatus, ScanReport,
};

use aggregator::ResultAggregator;
use classifier::{classify, ExecutionModel};
use config_doc::{parse_config, ConfigDocument};
use crossref::cross_reference;
use locator::ParameterLocator;
use repository::{RepositoryResolutionError, RepositorySearcher};

/// One raw job configuration handed to the engine. The engine does not care
/// whether it came from the Jenkins API, a disk export, or a test fixture.
#[derive(Debug, Clone)]
pub struct RawJobConfig {
    pub name: String,
    pub url: String,
    pub config_xml: String,
}

/// One scan invocation: feeds job configs through parse → classify → locate,
/// then joins them against the local repository tree.
///
/// Cross-referencing happens only in [`Scan::finish`], after every per-job
/// and per-repository finding is complete.
pub struct Scan {
    targets: Vec<String>,
    locator: ParameterLocator,
    searcher: Option<RepositorySearcher>,
    aggregator: ResultAggregator,
}

impl Scan {
    /// Validates the caller-input contract before any processing: the target
    /// set must be non-empty, and a supplied repository root must exist.
    pub fn new(
        jenkins_url: Option<&str>,
        targets: &[String],
        repositories_root: Option<&Path>,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(JobLensError::EmptyTargetSet);
        }
        let searcher = match repositories_root {
            Some(root) => Some(RepositorySearcher::new(root)?),
            None => None,
        };

        Ok(Self {
            targets: targets.to_vec(),
            locator: ParameterLocator::new(targets),
            searcher,
            aggregator: ResultAggregator::new(jenkins_url, targets),
        })
    }

    /// Records a job whose config could not be obtained at all, so it still
    /// appears in the report instead of vanishing.
    pub fn record_unavailable_job(&mut self, job_name: &str, job_url: &str, reason: &str) {
        self.aggregator.record_skipped(job_name, job_url, reason);
    }

    /// Parses and scans one job config. A malformed document excludes that
    /// job only; the scan continues for the others.
    pub fn process_config(&mut self, job_name: &str, job_url: &str, raw: &str) {
        match parse_config(job_name, job_url, raw) {
            Ok(doc) => self.process_document(&doc),
            Err(e) => self.aggregator.record_skipped(job_name, job_url, &e.to_string()),
        }
    }

    fn process_document(&mut self, doc: &ConfigDocument) {
        debug!(
            "Scanning '{}' ({:?}, {} bytes of config)",
            doc.job_name, doc.kind, doc.raw_size
        );
        let mut parameters = self.empty_parameter_map();

        for declared in &doc.declared_parameters {
            if let Some(finding) = parameters.get_mut(&declared.name) {
                finding.defined_as_parameter = true;
            }
        }

        let (resolution_status, resolved_repository, occurrences) = match classify(doc) {
            ExecutionModel::InlineScript => {
                let script = doc.inline_script.as_deref().unwrap_or_default();
                let occurrences = self.locator.locate(
                    script,
                    OccurrenceOrigin::InlineJobScript,
                    &doc.job_name,
                );
                (ResolutionStatus::Resolved, None, occurrences)
            }
            ExecutionModel::RepositoryScript => self.resolve_repository_script(doc),
            ExecutionModel::ConfigOnly => (ResolutionStatus::Resolved, None, Vec::new()),
        };

        apply_occurrences(&mut parameters, occurrences);

        self.aggregator.record_job(JobParameterFindings {
            job_name: doc.job_name.clone(),
            job_url: doc.job_url.clone(),
            kind: doc.kind,
            resolution_status,
            resolved_repository,
            parameters,
        });
    }

    fn resolve_repository_script(
        &self,
        doc: &ConfigDocument,
    ) -> (ResolutionStatus, Option<String>, Vec<ParameterOccurrence>) {
        let (Some(searcher), Some(scm)) = (&self.searcher, doc.scm_reference.as_ref()) else {
            return (ResolutionStatus::ScriptUnavailable, None, Vec::new());
        };

        match searcher.resolve(scm) {
            Ok(resolved) => {
                let identifier = format!("{}/{}", resolved.repository, resolved.script_path);
                let occurrences = self.locator.locate(
                    &resolved.text,
                    OccurrenceOrigin::RepositoryFile,
                    &identifier,
                );
                (
                    ResolutionStatus::Resolved,
                    Some(resolved.repository),
                    occurrences,
                )
            }
            Err(RepositoryResolutionError::RepositoryNotFoundLocally(_)) => {
                (ResolutionStatus::RepositoryNotFoundLocally, None, Vec::new())
            }
            Err(RepositoryResolutionError::ScriptFileNotFoundLocally { .. }) => {
                (ResolutionStatus::ScriptUnavailable, None, Vec::new())
            }
        }
    }

    /// Scans local repositories for pipeline definition files, joins the two
    /// finding sets, and seals the report.
    pub fn finish(mut self) -> Result<ScanReport> {
        let known_repositories = match &self.searcher {
            Some(searcher) => searcher.known_repositories()?,
            None => Vec::new(),
        };

        if let Some(searcher) = &self.searcher {
            for repository in &known_repositories {
                let files = searcher.pipeline_files(repository);
                if files.is_empty() {
                    continue;
                }

                let mut parameters = self.empty_parameter_map();
                let mut scanned_files = Vec::with_capacity(files.len());
                for (path, contents) in files {
                    let identifier = format!("{repository}/{path}");
                    let occurrences = self.locator.locate(
                        &contents,
                        OccurrenceOrigin::RepositoryFile,
                        &identifier,
                    );
                    apply_occurrences(&mut parameters, occurrences);
                    scanned_files.push(path);
                }

                self.aggregator.record_repository(RepositoryParameterFindings {
                    repository: repository.clone(),
                    scanned_files,
                    parameters,
                });
            }
        }

        let jobs = self.aggregator.jobs();
        let cross = cross_reference(&jobs, &known_repositories);
        Ok(self.aggregator.finish(cross))
    }

    fn empty_parameter_map(&self) -> IndexMap<String, ParameterFinding> {
        self.targets
            .iter()
            .map(|name| (name.clone(), ParameterFinding::default()))
            .collect()
    }
}

fn apply_occurrences(
    parameters: &mut IndexMap<String, ParameterFinding>,
    occurrences: Vec<ParameterOccurrence>,
) {
    use crate::findings::OccurrenceKind;

    for occurrence in occurrences {
        let Some(finding) = parameters.get_mut(&occurrence.parameter_name) else {
            continue;
        };
        match occurrence.kind {
            OccurrenceKind::DeclaredAsJobParameter => finding.defined_as_parameter = true,
            OccurrenceKind::UsedInScriptText => finding.used_in_script = true,
        }
        finding.occurrences.push(occurrence);
    }
}

/// Runs a full scan over already-materialized configs. Convenience wrapper
/// used by the offline config source and the repository-only mode.
pub fn run_scan(
    jenkins_url: Option<&str>,
    configs: Vec<RawJobConfig>,
    targets: &[String],
    repositories_root: Option<&Path>,
) -> Result<ScanReport> {
    let mut scan = Scan::new(jenkins_url, targets, repositories_root)?;
    for config in configs {
        scan.process_config(&config.name, &config.url, &config.config_xml);
    }
    scan.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{JobKind, MismatchKind, OccurrenceKind};
    use std::fs;
    use tempfile::TempDir;

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn inline_config(script: &str) -> String {
        format!(
            r#"<flow-definition>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition">
    <script>{script}</script>
  </definition>
</flow-definition>"#
        )
    }

    fn scm_config(repository_url: &str, script_path: &str) -> String {
        format!(
            r#"<flow-definition>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsScmFlowDefinition">
    <scm><url>{repository_url}</url></scm>
    <scriptPath>{script_path}</scriptPath>
  </definition>
</flow-definition>"#
        )
    }

    fn config(name: &str, xml: String) -> RawJobConfig {
        RawJobConfig {
            name: name.to_string(),
            url: format!("https://ci/job/{name}/"),
            config_xml: xml,
        }
    }

    #[test]
    fn test_inline_usage_without_declaration() {
        let configs = vec![config(
            "push-image",
            inline_config("sh 'docker push ${ECR_PATH}'"),
        )];

        let report = run_scan(None, configs, &targets(&["ECR_PATH"]), None).unwrap();
        assert_eq!(report.jobs.len(), 1);

        let finding = &report.jobs[0].parameters["ECR_PATH"];
        assert!(!finding.defined_as_parameter);
        assert!(finding.used_in_script);
        assert_eq!(finding.occurrences.len(), 1);
        assert_eq!(finding.occurrences[0].kind, OccurrenceKind::UsedInScriptText);
        assert_eq!(report.jobs[0].kind, JobKind::InlineScriptPipeline);
    }

    #[test]
    fn test_scm_job_with_missing_repository() {
        let root = TempDir::new().unwrap();
        let configs = vec![config(
            "app1-deploy",
            scm_config("https://github.com/acme/app1.git", "Jenkinsfile"),
        )];

        let report = run_scan(
            None,
            configs,
            &targets(&["ECR_PATH"]),
            Some(root.path()),
        )
        .unwrap();

        let job = &report.jobs[0];
        assert_eq!(
            job.resolution_status,
            ResolutionStatus::RepositoryNotFoundLocally
        );
        assert_eq!(
            report.cross_reference.jobs_missing_repository,
            vec!["app1-deploy"]
        );
        assert!(report.cross_reference.parameter_mismatches.is_empty());
    }

    #[test]
    fn test_declared_but_unused_mismatch() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("app1")).unwrap();
        fs::write(root.path().join("app1/Jenkinsfile"), "echo 'no parameters here'\n").unwrap();

        let xml = format!(
            r#"<flow-definition>
  <properties>
    <hudson.model.ParametersDefinitionProperty>
      <parameterDefinitions>
        <hudson.model.StringParameterDefinition>
          <name>ECR_PATH</name>
          <defaultValue>registry/app</defaultValue>
        </hudson.model.StringParameterDefinition>
      </parameterDefinitions>
    </hudson.model.ParametersDefinitionProperty>
  </properties>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsScmFlowDefinition">
    <scm><url>https://github.com/acme/app1.git</url></scm>
    <scriptPath>Jenkinsfile</scriptPath>
  </definition>
</flow-definition>"#
        );
        let configs = vec![config("app1-deploy", xml)];

        let report = run_scan(
            None,
            configs,
            &targets(&["ECR_PATH"]),
            Some(root.path()),
        )
        .unwrap();

        let job = &report.jobs[0];
        assert_eq!(job.resolution_status, ResolutionStatus::Resolved);
        assert_eq!(job.resolved_repository.as_deref(), Some("app1"));

        let mismatches = &report.cross_reference.parameter_mismatches;
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].parameter_name, "ECR_PATH");
        assert_eq!(mismatches[0].job_name, "app1-deploy");
        assert_eq!(mismatches[0].kind, MismatchKind::DeclaredButUnused);
    }

    #[test]
    fn test_repository_without_job() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("app2")).unwrap();
        fs::write(
            root.path().join("app2/Jenkinsfile"),
            "sh 'docker push ${ECR_PATH}'\n",
        )
        .unwrap();

        let configs = vec![config(
            "unrelated",
            inline_config("echo 'nothing to see'"),
        )];

        let report = run_scan(
            None,
            configs,
            &targets(&["ECR_PATH"]),
            Some(root.path()),
        )
        .unwrap();

        assert_eq!(
            report.cross_reference.repositories_without_job,
            vec!["app2"]
        );
        assert_eq!(report.repositories.len(), 1);
        let repo = &report.repositories[0];
        assert_eq!(repo.repository, "app2");
        assert!(repo.parameters["ECR_PATH"].used_in_script);
        assert_eq!(
            repo.parameters["ECR_PATH"].occurrences[0].origin_identifier,
            "app2/Jenkinsfile"
        );
    }

    #[test]
    fn test_malformed_config_is_skipped_not_fatal() {
        let configs = vec![
            config("broken", "<flow-definition".to_string()),
            config("good", inline_config("echo ECR_PATH")),
        ];

        let report = run_scan(None, configs, &targets(&["ECR_PATH"]), None).unwrap();
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.skipped_jobs.len(), 1);
        assert_eq!(report.skipped_jobs[0].job_name, "broken");
        assert_eq!(report.total_jobs, 2);
    }

    #[test]
    fn test_scm_job_without_repository_root_is_script_unavailable() {
        let configs = vec![config(
            "app1-deploy",
            scm_config("https://github.com/acme/app1.git", "Jenkinsfile"),
        )];

        let report = run_scan(None, configs, &targets(&["ECR_PATH"]), None).unwrap();
        let job = &report.jobs[0];
        assert_eq!(job.resolution_status, ResolutionStatus::ScriptUnavailable);
        assert!(!job.parameters["ECR_PATH"].used_in_script);
        assert!(report.cross_reference.parameter_mismatches.is_empty());
    }

    #[test]
    fn test_empty_target_set_aborts_the_scan() {
        let err = run_scan(None, Vec::new(), &[], None).unwrap_err();
        assert!(matches!(err, JobLensError::EmptyTargetSet));
    }

    #[test]
    fn test_missing_repository_root_aborts_the_scan() {
        let err = run_scan(
            None,
            Vec::new(),
            &targets(&["ECR_PATH"]),
            Some(Path::new("/no/such/root")),
        )
        .unwrap_err();
        assert!(matches!(err, JobLensError::RepositoryRootMissing(_)));
    }

    #[test]
    fn test_stable_output_across_runs() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("app1")).unwrap();
        fs::write(
            root.path().join("app1/Jenkinsfile"),
            "string(name: 'ECR_PATH', defaultValue: '')\nsh \"push ${ECR_PATH}\"\n",
        )
        .unwrap();

        let run = || {
            run_scan(
                None,
                vec![config(
                    "app1-deploy",
                    scm_config("https://github.com/acme/app1.git", "Jenkinsfile"),
                )],
                &targets(&["ECR_PATH", "AWS_REGION"]),
                Some(root.path()),
            )
            .unwrap()
        };

        let first = run();
        let second = run();
        assert_eq!(
            first.jobs[0].parameters["ECR_PATH"].occurrences,
            second.jobs[0].parameters["ECR_PATH"].occurrences
        );
        assert_eq!(
            serde_json::to_string(&first.cross_reference).unwrap(),
            serde_json::to_string(&second.cross_reference).unwrap()
        );
    }
}
