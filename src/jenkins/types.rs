use serde::Deserialize;

/// One level of the Jenkins job tree, as returned by the `api/json`
/// endpoint with a `jobs[...]` tree query.
#[derive(Debug, Default, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub jobs: Vec<JenkinsJob>,
}

/// A single entry in a Jenkins job listing. Folders and jobs share the
/// same shape; `_class` tells them apart.
#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsJob {
    pub name: String,
    pub url: String,
    #[serde(rename = "_class", default)]
    pub class_name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` when the job has never been built.
    #[serde(rename = "lastBuild", default)]
    pub last_build: Option<BuildStamp>,
}

/// The slice of a Jenkins build record the tree query asks for.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildStamp {
    /// Build start time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl JenkinsJob {
    /// Container entries whose children must be listed rather than the
    /// entry itself being scanned.
    pub fn is_folder(&self) -> bool {
        self.class_name.contains("Folder") || self.class_name.contains("MultiBranchProject")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_detection() {
        let folder = JenkinsJob {
            name: "team".to_string(),
            url: "https://ci/job/team/".to_string(),
            class_name: "com.cloudbees.hudson.plugins.folder.Folder".to_string(),
            color: None,
            description: None,
            last_build: None,
        };
        assert!(folder.is_folder());

        let job = JenkinsJob {
            name: "deploy".to_string(),
            url: "https://ci/job/deploy/".to_string(),
            class_name: "org.jenkinsci.plugins.workflow.job.WorkflowJob".to_string(),
            color: Some("blue".to_string()),
            description: None,
            last_build: None,
        };
        assert!(!job.is_folder());
    }

    #[test]
    fn test_listing_deserialization() {
        let raw = r#"{"jobs":[{"name":"a","url":"https://ci/job/a/","_class":"hudson.model.FreeStyleProject"}]}"#;
        let listing: JobListing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.jobs.len(), 1);
        assert_eq!(listing.jobs[0].name, "a");
        assert!(listing.jobs[0].color.is_none());
        assert!(listing.jobs[0].last_build.is_none());
    }

    #[test]
    fn test_last_build_deserialization() {
        let raw = r#"{"jobs":[
            {"name":"built","url":"https://ci/job/built/","_class":"hudson.model.FreeStyleProject","lastBuild":{"timestamp":1700000000000}},
            {"name":"never","url":"https://ci/job/never/","_class":"hudson.model.FreeStyleProject","lastBuild":null}
        ]}"#;
        let listing: JobListing = serde_json::from_str(raw).unwrap();
        assert_eq!(
            listing.jobs[0].last_build.as_ref().unwrap().timestamp,
            1_700_000_000_000
        );
        assert!(listing.jobs[1].last_build.is_none());
    }
}
