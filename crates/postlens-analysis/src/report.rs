//! In-depth HTML report over analysis results.
//!
//! The report model receives an operator-supplied prompt, a behavioral
//! framework document, and the results JSON, and answers with a complete
//! HTML page. An optional banner fragment is injected right after `<body>`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use postlens_core::RetryPolicy;
use regex::Regex;

use crate::error::AnalysisError;
use crate::store::Generator;

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>").expect("valid body tag regex"));

/// Files and settings for one report.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub prompt_path: PathBuf,
    pub framework_path: PathBuf,
    pub results_path: PathBuf,
    pub output_path: PathBuf,
    /// HTML fragment placed at the top of the page.
    pub banner_html: Option<String>,
    pub model: String,
}

impl ReportInputs {
    /// Conventional output location: `<dir>/<username>_in_depth_report.html`.
    #[must_use]
    pub fn default_output_path(dir: &Path, username: &str) -> PathBuf {
        dir.join(format!("{username}_in_depth_report.html"))
    }
}

/// Removes a surrounding markdown fence (```` ```html ```` or bare ```` ``` ````).
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```html")
        .trim_start_matches("```HTML")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Places `banner` after the opening `<body…>` tag, or before everything when
/// the document has no body tag.
#[must_use]
pub fn inject_banner(html: &str, banner: &str) -> String {
    match BODY_OPEN.find(html) {
        Some(tag) => {
            let mut out = String::with_capacity(html.len() + banner.len() + 1);
            out.push_str(&html[..tag.end()]);
            out.push('\n');
            out.push_str(banner);
            out.push_str(&html[tag.end()..]);
            out
        }
        None => format!("{banner}{html}"),
    }
}

fn compose_prompt(instructions: &str, framework: &str, results_json: &str) -> String {
    format!(
        "{instructions}\n\n\
IMPORTANT: Return pure HTML code without any markdown wrappers (no ```html or ```). \
Use absolute URLs or data URIs for images.\n\n\
Behavioral Framework:\n{framework}\n\n\
Outlier Data (JSON):\n{results_json}\n"
    )
}

async fn read_text(path: &Path) -> Result<String, AnalysisError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnalysisError::io(path, e))
}

/// Generates the report and writes it to `inputs.output_path`.
///
/// # Errors
///
/// Returns [`AnalysisError::Io`] when an input cannot be read or the output
/// cannot be written, [`AnalysisError::Json`] when the results file is not
/// JSON, and the generator's error once `retry` is exhausted.
pub async fn generate_in_depth_report<G>(
    generator: &G,
    inputs: &ReportInputs,
    retry: &RetryPolicy,
) -> Result<PathBuf, AnalysisError>
where
    G: Generator + ?Sized,
{
    let instructions = read_text(&inputs.prompt_path).await?;
    let framework = read_text(&inputs.framework_path).await?;
    let results_raw = read_text(&inputs.results_path).await?;
    let results: serde_json::Value =
        serde_json::from_str(&results_raw).map_err(|e| AnalysisError::Json {
            context: inputs.results_path.display().to_string(),
            source: e,
        })?;
    let results_json =
        serde_json::to_string_pretty(&results).map_err(|e| AnalysisError::Json {
            context: "results".to_owned(),
            source: e,
        })?;

    let prompt = compose_prompt(&instructions, &framework, &results_json);
    tracing::info!(model = %inputs.model, "requesting in-depth report");
    let raw = postlens_core::retry(retry, AnalysisError::is_overload, || {
        generator.generate(&inputs.model, &[], &prompt)
    })
    .await?;

    let html = strip_code_fences(&raw);
    let html = match inputs.banner_html.as_deref() {
        Some(banner) => inject_banner(html, banner),
        None => html.to_owned(),
    };

    if let Some(parent) = inputs.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AnalysisError::io(parent, e))?;
    }
    tokio::fs::write(&inputs.output_path, html)
        .await
        .map_err(|e| AnalysisError::io(&inputs.output_path, e))?;
    tracing::info!(output = %inputs.output_path.display(), "in-depth report written");
    Ok(inputs.output_path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence() {
        assert_eq!(strip_code_fences("```html\n<html></html>\n```"), "<html></html>");
        assert_eq!(strip_code_fences("<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn banner_goes_after_body_with_attributes() {
        let out = inject_banner("<html><body class=\"x\"><p>hi</p></body></html>", "<img>");
        assert_eq!(out, "<html><body class=\"x\">\n<img><p>hi</p></body></html>");
    }

    #[test]
    fn banner_is_prepended_without_body() {
        assert_eq!(inject_banner("<p>hi</p>", "<img>"), "<img><p>hi</p>");
    }

    #[test]
    fn prompt_embeds_framework_and_results() {
        let p = compose_prompt("Write a report.", "Framework text", "[1]");
        assert!(p.starts_with("Write a report."));
        assert!(p.contains("Behavioral Framework:\nFramework text"));
        assert!(p.ends_with("Outlier Data (JSON):\n[1]\n"));
    }
}
