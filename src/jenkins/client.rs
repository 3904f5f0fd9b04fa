use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::auth::Credentials;
use crate::error::{JobLensError, Result};

use super::types::{JenkinsJob, JobListing};

/// Tree query kept narrow so large controllers answer quickly.
const JOB_TREE_QUERY: &str = "jobs[name,url,_class,color,description,lastBuild[timestamp]]";

/// Jenkins REST API client for listing jobs and fetching their configs.
#[derive(Clone)]
pub struct JenkinsClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl JenkinsClient {
    /// Creates a client for one Jenkins controller. `base_url` must be an
    /// absolute URL; credentials, when given, are sent as HTTP basic auth
    /// with the API token as the password.
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("joblens/0.3"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Lists every scannable job on the controller, descending into folders
    /// and multibranch containers iteratively.
    ///
    /// A failure listing the root is fatal; a failure inside a subfolder
    /// skips that subtree with a warning so one broken folder cannot hide
    /// the rest of the controller.
    pub async fn list_jobs(&self) -> Result<Vec<JenkinsJob>> {
        let mut jobs = Vec::new();
        let mut pending = vec![self.base_url.as_str().to_string()];
        let mut at_root = true;

        while let Some(container_url) = pending.pop() {
            let listing = match self.list_container(&container_url).await {
                Ok(listing) => listing,
                Err(e) if at_root => return Err(e),
                Err(e) => {
                    warn!("Skipping folder {container_url}: {e}");
                    continue;
                }
            };
            at_root = false;

            for entry in listing.jobs {
                if entry.is_folder() {
                    debug!("Descending into folder '{}'", entry.name);
                    pending.push(entry.url);
                } else {
                    jobs.push(entry);
                }
            }
        }

        Ok(jobs)
    }

    /// Fetches the raw `config.xml` of one job.
    pub async fn fetch_job_config(&self, job_url: &str) -> Result<String> {
        let url = format!("{}config.xml", ensure_trailing_slash(job_url));
        let response = self.get(&url).await?;
        Ok(response.text().await?)
    }

    async fn list_container(&self, container_url: &str) -> Result<JobListing> {
        let url = format!(
            "{}api/json?tree={JOB_TREE_QUERY}",
            ensure_trailing_slash(container_url)
        );
        let response = self.get(&url).await?;
        Ok(response.json().await?)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(credentials.username(), Some(credentials.token()));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(JobLensError::Api(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
