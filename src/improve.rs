//! The improve module runs the advisory path: it asks the model for a better
//! version of normalized HTML and stores both versions.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::advisory::Advisor;
use crate::constants::{DEFAULT_PROMPT_TEMPLATE, THINK_STRIPPER};
use crate::error::ImproveError;
use crate::storage::{RecordStore, StoredRecord};

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));

/// Shared collaborators of one advisory run.
pub struct ImproveContext<'a> {
    /// Model used to rewrite the HTML
    pub advisor: &'a dyn Advisor,
    /// Table receiving the original and improved HTML
    pub store: &'a dyn RecordStore,
    /// Prompt template to use, `{html}` is replaced with the document
    pub prompt_template: Option<&'a str>,
}

/// Builds the model prompt for `html`.
///
/// If the template has no `{html}` placeholder the document is appended after a blank line.
pub fn build_prompt(template: Option<&str>, html: &str) -> String {
    let template = template.unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    if template.contains("{html}") {
        template.replace("{html}", html)
    } else {
        format!("{}\n\n{html}", template.trim_end())
    }
}

/// Removes `<think>` blocks and surrounding whitespace from a model answer.
pub fn clean_answer(answer: &str) -> String {
    THINK_STRIPPER_REGEX
        .replace_all(answer, "")
        .trim()
        .to_owned()
}

/// Asks the model to improve `normalized_html`, stores the pair and returns the
/// improved HTML.
///
/// # Errors
///
/// Returns an error if:
/// * The model process fails or cannot be started
/// * The record cannot be stored
pub async fn improve_html(
    ctx: &ImproveContext<'_>,
    normalized_html: &str,
) -> Result<String, ImproveError> {
    let prompt = build_prompt(ctx.prompt_template, normalized_html);

    let improved_html = clean_answer(&ctx.advisor.advise(&prompt).await?);
    debug!("Model answered with {} bytes", improved_html.len());

    let record = StoredRecord {
        original_html: normalized_html.to_owned(),
        improved_html,
    };
    ctx.store.insert(&record).await?;
    info!("Stored improved HTML");

    Ok(record.improved_html)
}
