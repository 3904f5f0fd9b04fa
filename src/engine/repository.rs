use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::error::{JobLensError, Result};

use super::config_doc::ScmReference;

/// Why a job's source-controlled script could not be read. Both variants are
/// non-fatal: they downgrade the owning job's resolution status and the scan
/// proceeds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryResolutionError {
    #[error("no local repository matches '{0}'")]
    RepositoryNotFoundLocally(String),

    #[error("repository '{repository}' has no readable file at '{script_path}'")]
    ScriptFileNotFoundLocally {
        repository: String,
        script_path: String,
    },
}

/// A source-controlled pipeline script read from a local checkout.
#[derive(Debug, Clone)]
pub struct ResolvedScript {
    /// Local repository directory name the SCM reference resolved to.
    pub repository: String,
    pub script_path: String,
    pub text: String,
}

/// Locates repositories and pipeline definition files under a local root.
///
/// The searcher reads whatever is currently checked out; it never switches
/// branches, so a job's declared branch may differ from what is scanned.
/// This is a stated limitation of local resolution.
#[derive(Debug)]
pub struct RepositorySearcher {
    root: PathBuf,
}

impl RepositorySearcher {
    /// Fails if `root` is not an existing directory; requesting
    /// repository-based resolution against a missing root is a caller
    /// contract violation, checked before any processing begins.
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(JobLensError::RepositoryRootMissing(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Names of all repository directories under the root, sorted for
    /// deterministic report ordering.
    pub fn known_repositories(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Resolves an SCM reference to the script file of a local checkout.
    ///
    /// The repository URL is normalized to a candidate directory name and
    /// matched exactly first, then case-insensitively.
    pub fn resolve(
        &self,
        scm: &ScmReference,
    ) -> std::result::Result<ResolvedScript, RepositoryResolutionError> {
        let candidate = candidate_directory_name(&scm.repository_url);

        let repository = self.find_directory(&candidate).ok_or_else(|| {
            RepositoryResolutionError::RepositoryNotFoundLocally(candidate.clone())
        })?;

        let script_file = self.root.join(&repository).join(&scm.script_path);
        let text = fs::read_to_string(&script_file).map_err(|e| {
            debug!("Could not read {}: {e}", script_file.display());
            RepositoryResolutionError::ScriptFileNotFoundLocally {
                repository: repository.clone(),
                script_path: scm.script_path.clone(),
            }
        })?;

        Ok(ResolvedScript {
            repository,
            script_path: scm.script_path.clone(),
            text,
        })
    }

    /// Pipeline definition files inside one repository, as
    /// `(repository-relative path, contents)` pairs sorted by path.
    /// Unreadable files are skipped with a warning.
    pub fn pipeline_files(&self, repository: &str) -> Vec<(String, String)> {
        let repo_dir = self.root.join(repository);
        let mut paths = Vec::new();
        collect_pipeline_files(&repo_dir, &repo_dir, &mut paths);
        paths.sort();

        paths
            .into_iter()
            .filter_map(|relative| {
                match fs::read_to_string(repo_dir.join(&relative)) {
                    Ok(contents) => Some((relative, contents)),
                    Err(e) => {
                        warn!("Skipping unreadable file {repository}/{relative}: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    fn find_directory(&self, candidate: &str) -> Option<String> {
        let exact = self.root.join(candidate);
        if exact.is_dir() {
            return Some(candidate.to_string());
        }

        fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .find(|name| name.eq_ignore_ascii_case(candidate))
    }
}

/// Normalizes a repository URL to the directory name a local clone would
/// have: protocol, host, and a trailing `.git` are stripped.
///
/// `https://github.com/acme/app1.git` and `git@github.com:acme/app1` both
/// normalize to `app1`.
pub fn candidate_directory_name(repository_url: &str) -> String {
    let trimmed = repository_url.trim().trim_end_matches('/');
    let without_git = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let after_slash = without_git.rsplit('/').next().unwrap_or(without_git);
    // scp-like URLs without a path slash still carry host:name
    after_slash
        .rsplit(':')
        .next()
        .unwrap_or(after_slash)
        .to_string()
}

fn collect_pipeline_files(repo_dir: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            if name != ".git" {
                collect_pipeline_files(repo_dir, &path, out);
            }
        } else if is_pipeline_file(&name) {
            if let Ok(relative) = path.strip_prefix(repo_dir) {
                out.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}

/// Conventional pipeline definition file names: `Jenkinsfile`,
/// `Jenkinsfile.*`, and Groovy sources.
fn is_pipeline_file(name: &str) -> bool {
    name.starts_with("Jenkinsfile") || name.ends_with(".groovy")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scm(url: &str, script_path: &str) -> ScmReference {
        ScmReference {
            repository_url: url.to_string(),
            branch: "unspecified".to_string(),
            script_path: script_path.to_string(),
        }
    }

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_candidate_directory_name() {
        assert_eq!(
            candidate_directory_name("https://github.com/acme/app1.git"),
            "app1"
        );
        assert_eq!(
            candidate_directory_name("git@github.com:acme/app1.git"),
            "app1"
        );
        assert_eq!(
            candidate_directory_name("https://git.acme.io/team/sub/app2/"),
            "app2"
        );
        assert_eq!(candidate_directory_name("app3"), "app3");
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let err = RepositorySearcher::new(Path::new("/does/not/exist")).unwrap_err();
        assert!(matches!(err, JobLensError::RepositoryRootMissing(_)));
    }

    #[test]
    fn test_resolve_exact_match() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "app1/Jenkinsfile", "echo 'hi'");

        let searcher = RepositorySearcher::new(root.path()).unwrap();
        let resolved = searcher
            .resolve(&scm("https://github.com/acme/app1.git", "Jenkinsfile"))
            .unwrap();
        assert_eq!(resolved.repository, "app1");
        assert_eq!(resolved.text, "echo 'hi'");
    }

    #[test]
    fn test_resolve_case_insensitive_match() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "App1/Jenkinsfile", "echo 'hi'");

        let searcher = RepositorySearcher::new(root.path()).unwrap();
        let resolved = searcher
            .resolve(&scm("https://github.com/acme/app1.git", "Jenkinsfile"))
            .unwrap();
        assert_eq!(resolved.repository, "App1");
    }

    #[test]
    fn test_repository_not_found() {
        let root = TempDir::new().unwrap();
        let searcher = RepositorySearcher::new(root.path()).unwrap();
        let err = searcher
            .resolve(&scm("https://github.com/acme/app1.git", "Jenkinsfile"))
            .unwrap_err();
        assert_eq!(
            err,
            RepositoryResolutionError::RepositoryNotFoundLocally("app1".to_string())
        );
    }

    #[test]
    fn test_script_file_not_found() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("app1")).unwrap();

        let searcher = RepositorySearcher::new(root.path()).unwrap();
        let err = searcher
            .resolve(&scm("https://github.com/acme/app1.git", "ci/Jenkinsfile"))
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryResolutionError::ScriptFileNotFoundLocally { .. }
        ));
    }

    #[test]
    fn test_pipeline_files_walk() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "app1/Jenkinsfile", "a");
        write_file(root.path(), "app1/ci/deploy.groovy", "b");
        write_file(root.path(), "app1/src/main.rs", "c");
        write_file(root.path(), "app1/.git/Jenkinsfile", "d");

        let searcher = RepositorySearcher::new(root.path()).unwrap();
        let files = searcher.pipeline_files("app1");
        let names: Vec<&str> = files.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(names, vec!["Jenkinsfile", "ci/deploy.groovy"]);
    }

    #[test]
    fn test_known_repositories_sorted() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("zeta")).unwrap();
        fs::create_dir(root.path().join("alpha")).unwrap();
        fs::write(root.path().join("notes.txt"), "n").unwrap();

        let searcher = RepositorySearcher::new(root.path()).unwrap();
        assert_eq!(searcher.known_repositories().unwrap(), vec!["alpha", "zeta"]);
    }
}
