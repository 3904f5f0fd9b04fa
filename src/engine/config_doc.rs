use log::debug;

use crate::error::{JobLensError, Result};
use crate::findings::JobKind;

/// Source-control reference carried by an SCM pipeline job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmReference {
    pub repository_url: String,
    pub branch: String,
    pub script_path: String,
}

/// A parameter declared as a job input in the config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredParameter {
    pub name: String,
    pub default_value: Option<String>,
}

/// One job's configuration, normalized from its raw `config.xml`.
///
/// Exactly one of `inline_script` / `scm_reference` is present for pipeline
/// kinds; `FreeForm` and `Unknown` carry neither. Constructed once per
/// fetched config and immutable thereafter.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub job_name: String,
    pub job_url: String,
    pub kind: JobKind,
    pub inline_script: Option<String>,
    pub scm_reference: Option<ScmReference>,
    pub declared_parameters: Vec<DeclaredParameter>,
    /// Size of the raw document in bytes, kept for diagnostics.
    pub raw_size: usize,
}

const DEFAULT_BRANCH: &str = "unspecified";
const DEFAULT_SCRIPT_PATH: &str = "Jenkinsfile";

/// Parses one raw `config.xml` document into a [`ConfigDocument`].
///
/// An empty document yields `Unknown`, not an error. A document that cannot
/// be parsed as XML at all fails with [`JobLensError::MalformedConfig`],
/// which is fatal for this job only.
pub fn parse_config(job_name: &str, job_url: &str, raw: &str) -> Result<ConfigDocument> {
    if raw.trim().is_empty() {
        return Ok(ConfigDocument {
            job_name: job_name.to_string(),
            job_url: job_url.to_string(),
            kind: JobKind::Unknown,
            inline_script: None,
            scm_reference: None,
            declared_parameters: Vec::new(),
            raw_size: raw.len(),
        });
    }

    let doc = roxmltree::Document::parse(raw).map_err(|e| JobLensError::MalformedConfig {
        job: job_name.to_string(),
        reason: e.to_string(),
    })?;

    let root = doc.root_element();
    let declared_parameters = extract_declared_parameters(&doc);
    let (kind, inline_script, scm_reference) = extract_execution_model(&doc, root);

    debug!(
        "Parsed config for '{job_name}': kind={kind:?}, {} declared parameter(s)",
        declared_parameters.len()
    );

    Ok(ConfigDocument {
        job_name: job_name.to_string(),
        job_url: job_url.to_string(),
        kind,
        inline_script,
        scm_reference,
        declared_parameters,
        raw_size: raw.len(),
    })
}

/// Declared parameters live under `*ParameterDefinition` elements and are
/// extracted regardless of job kind. A missing section yields an empty list.
fn extract_declared_parameters(doc: &roxmltree::Document) -> Vec<DeclaredParameter> {
    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name().ends_with("ParameterDefinition"))
        .filter_map(|definition| {
            let name = child_text(definition, "name")?;
            let default_value = child_text(definition, "defaultValue");
            Some(DeclaredParameter {
                name,
                default_value,
            })
        })
        .collect()
}

fn extract_execution_model<'a>(
    doc: &'a roxmltree::Document,
    root: roxmltree::Node<'a, 'a>,
) -> (JobKind, Option<String>, Option<ScmReference>) {
    if root.tag_name().name() == "flow-definition" {
        let Some(definition) = find_descendant(root, "definition") else {
            return (JobKind::Unknown, None, None);
        };
        let class = definition.attribute("class").unwrap_or_default();

        if class.contains("CpsScmFlowDefinition") {
            if let Some(scm) = extract_scm_reference(definition) {
                return (JobKind::SourceControlledPipeline, None, Some(scm));
            }
            return (JobKind::Unknown, None, None);
        }

        if class.contains("CpsFlowDefinition") {
            let script = extract_inline_script(definition);
            if script.trim().is_empty() {
                return (JobKind::Unknown, None, None);
            }
            return (JobKind::InlineScriptPipeline, Some(script), None);
        }

        return (JobKind::Unknown, None, None);
    }

    if is_free_form(doc, root) {
        return (JobKind::FreeForm, None, None);
    }

    (JobKind::Unknown, None, None)
}

/// Concatenates every `<script>` block under the definition in document
/// order. Joining with a newline keeps later blocks' line numbers meaningful
/// when the combined text is scanned.
fn extract_inline_script(definition: roxmltree::Node) -> String {
    let blocks: Vec<&str> = definition
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "script")
        .filter_map(|node| node.text())
        .collect();
    blocks.join("\n")
}

fn extract_scm_reference(definition: roxmltree::Node) -> Option<ScmReference> {
    let scm = find_descendant(definition, "scm")?;
    let repository_url = find_descendant(scm, "url").and_then(|node| node.text())?;

    let branch = scm
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name().ends_with("BranchSpec"))
        .and_then(|spec| child_text(spec, "name"))
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    let script_path = find_descendant(definition, "scriptPath")
        .and_then(|node| node.text())
        .unwrap_or(DEFAULT_SCRIPT_PATH)
        .to_string();

    Some(ScmReference {
        repository_url: repository_url.trim().to_string(),
        branch: branch.trim().to_string(),
        script_path: script_path.trim().to_string(),
    })
}

/// Freestyle-style jobs are recognized by their root element or by the
/// presence of configured build steps.
fn is_free_form(doc: &roxmltree::Document, root: roxmltree::Node) -> bool {
    matches!(
        root.tag_name().name(),
        "project" | "maven2-moduleset" | "matrix-project"
    ) || doc
        .descendants()
        .any(|node| node.is_element() && node.tag_name().name() == "builders")
}

fn find_descendant<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: roxmltree::Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|text| text.trim().to_string())
}
