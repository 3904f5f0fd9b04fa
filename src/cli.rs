use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::Credentials;
use crate::config::{Config, OutputFormat};
use crate::engine::{self, RawJobConfig};
use crate::findings::{CrossReferenceReport, ScanReport};
use crate::jenkins::{JenkinsClient, JenkinsScanner};
use crate::output::{export_report, print_summary};

#[derive(Parser)]
#[command(name = "joblens")]
#[command(author, version, about = "Jenkins Job & Parameter Audit Tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Jenkins jobs for target parameter declarations and usages
    Scan {
        #[arg(long, env = "JENKINS_URL")]
        jenkins_url: Option<String>,

        #[arg(long, env = "JENKINS_USER")]
        username: Option<String>,

        #[arg(long, env = "JENKINS_TOKEN")]
        token: Option<String>,

        /// Scan exported config.xml files from this directory instead of a
        /// live controller
        #[arg(long)]
        configs_dir: Option<PathBuf>,

        /// Directory containing local repository checkouts
        #[arg(short, long)]
        repos_root: Option<PathBuf>,

        /// Target parameter names
        #[arg(short = 'P', long = "parameter", num_args = 1..)]
        parameters: Vec<String>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Concurrent config fetches
        #[arg(long)]
        concurrency: Option<usize>,

        /// Also report jobs whose last build is older than this many days
        #[arg(long, value_name = "DAYS")]
        inactive_days: Option<u64>,
    },
    /// Scan local repository checkouts only, without contacting Jenkins
    Repos {
        #[arg(short, long)]
        repos_root: Option<PathBuf>,

        /// Target parameter names
        #[arg(short = 'P', long = "parameter", num_args = 1..)]
        parameters: Vec<String>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Scan {
                jenkins_url,
                username,
                token,
                configs_dir,
                repos_root,
                parameters,
                config,
                concurrency,
                inactive_days,
            } => {
                self.execute_scan(
                    jenkins_url.as_deref(),
                    username.as_deref(),
                    token.as_deref(),
                    configs_dir.as_deref(),
                    repos_root.as_deref(),
                    parameters,
                    config.as_deref(),
                    *concurrency,
                    *inactive_days,
                )
                .await
            }
            Commands::Repos {
                repos_root,
                parameters,
                config,
            } => self.execute_repos(repos_root.as_deref(), parameters, config.as_deref()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_scan(
        &self,
        jenkins_url: Option<&str>,
        username: Option<&str>,
        token: Option<&str>,
        configs_dir: Option<&Path>,
        repos_root: Option<&Path>,
        parameters: &[String],
        config: Option<&Path>,
        concurrency: Option<usize>,
        inactive_days: Option<u64>,
    ) -> Result<()> {
        let file_config = Config::load(config)?;

        let parameters = merge_parameters(parameters, &file_config);
        let repos_root = repos_root
            .map(Path::to_path_buf)
            .or_else(|| file_config.repositories.root.clone());
        let format = self.format.unwrap_or(file_config.output.format);
        let pretty = self.pretty || file_config.output.pretty;

        let report = if let Some(dir) = configs_dir {
            let configs = load_config_files(dir)?;
            info!("Scanning {} config files from {}", configs.len(), dir.display());
            engine::run_scan(None, configs, &parameters, repos_root.as_deref())?
        } else {
            let url = jenkins_url
                .map(str::to_string)
                .or_else(|| file_config.jenkins.url.clone())
                .context("A Jenkins URL is required unless --configs-dir is given")?;

            let username = username
                .map(str::to_string)
                .or_else(|| file_config.jenkins.username.clone());
            let token = token
                .map(str::to_string)
                .or_else(|| file_config.jenkins.token.clone());
            let credentials = match (username, token) {
                (Some(username), Some(token)) => Some(Credentials::new(&username, &token)),
                (None, None) => None,
                _ => bail!("Jenkins credentials need both a username and a token"),
            };

            let inactive_days = inactive_days.or(file_config.scan.inactive_days);

            info!("Scanning Jenkins controller at {url}");
            let client = JenkinsClient::new(&url, credentials)?;
            let scanner =
                JenkinsScanner::new(client, concurrency.unwrap_or(file_config.jenkins.concurrency));
            scanner
                .scan(&parameters, repos_root.as_deref(), inactive_days)
                .await?
        };

        self.render(&report, format, pretty)
    }

    fn execute_repos(
        &self,
        repos_root: Option<&Path>,
        parameters: &[String],
        config: Option<&Path>,
    ) -> Result<()> {
        let file_config = Config::load(config)?;

        let parameters = merge_parameters(parameters, &file_config);
        let root = repos_root
            .map(Path::to_path_buf)
            .or_else(|| file_config.repositories.root.clone())
            .context("A repository root is required (use --repos-root or the config file)")?;
        let format = self.format.unwrap_or(file_config.output.format);
        let pretty = self.pretty || file_config.output.pretty;

        info!("Scanning repositories under {}", root.display());
        let scan = engine::Scan::new(None, &parameters, Some(&root))?;
        let mut report = scan.finish()?;
        // No jobs were scanned, so the job/repository comparison carries no signal.
        report.cross_reference = CrossReferenceReport::default();

        self.render(&report, format, pretty)
    }

    fn render(&self, report: &ScanReport, format: OutputFormat, pretty: bool) -> Result<()> {
        if format == OutputFormat::Summary {
            print_summary(report);
            return Ok(());
        }

        if let Some(path) = &self.output {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create report file: {}", path.display()))?;
            export_report(report, format, pretty, &mut file)?;
            info!("Report written to: {}", path.display());
        } else {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            export_report(report, format, pretty, &mut handle)?;
        }

        Ok(())
    }
}

fn merge_parameters(cli_parameters: &[String], config: &Config) -> Vec<String> {
    if cli_parameters.is_empty() {
        config.scan.parameters.clone()
    } else {
        cli_parameters.to_vec()
    }
}

/// Reads every `.xml` file in `dir` as an exported job config. The file stem
/// becomes the job name; files are taken in name order.
fn load_config_files(dir: &Path) -> Result<Vec<RawJobConfig>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read configs directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("xml"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("No .xml config files found in {}", dir.display());
    }

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unnamed-job")
            .to_string();
        let config_xml = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        configs.push(RawJobConfig {
            name,
            url: path.display().to_string(),
            config_xml,
        });
    }

    Ok(configs)
}
