//! Markdown rendering of assistant replies.

use crate::config::Messages;
use crate::models::Article;

/// Truncates `text` to at most `max_chars` characters, appending `...` when
/// anything was cut. Counts characters, not bytes.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// Renders one article as a numbered markdown entry.
fn render_article(out: &mut String, number: usize, article: &Article, max_abstract_len: usize) {
    out.push_str(&format!("{}. **{}**\n", number, article.title));

    if !article.authors.is_empty() {
        out.push_str(&format!("   {}\n", article.authors.join(", ")));
    }

    let venue = match (article.journal.as_deref(), article.date.as_deref()) {
        (Some(journal), Some(date)) => Some(format!("*{}*, {}", journal, date)),
        (Some(journal), None) => Some(format!("*{}*", journal)),
        (None, Some(date)) => Some(date.to_string()),
        (None, None) => None,
    };
    if let Some(venue) = venue {
        out.push_str(&format!("   {}\n", venue));
    }

    if let Some(abstract_text) = article
        .abstract_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        out.push_str(&format!("   {}\n", truncate(abstract_text, max_abstract_len)));
    }
}

/// Renders a non-empty result list framed by the lead-in and closing lines.
pub fn results_message(
    messages: &Messages,
    articles: &[Article],
    max_abstract_len: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&messages.results_intro);
    out.push_str("\n\n");

    for (index, article) in articles.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_article(&mut out, index + 1, article, max_abstract_len);
    }

    out.push('\n');
    out.push_str(&messages.results_outro);
    out
}

/// Renders a summary reply. The title appears verbatim, appended to the
/// intro when the intro has no `{title}` placeholder.
pub fn summary_message(messages: &Messages, title: &str, summary: &str) -> String {
    let intro = if messages.summary_intro.contains("{title}") {
        messages.summary_intro.replace("{title}", title)
    } else {
        format!("{} **{}**", messages.summary_intro.trim_end(), title)
    };
    format!("{}\n\n{}", intro, summary.trim())
}

/// Appends the retry hint to an apology when the failure was transient.
pub fn failure_message(messages: &Messages, base: &str, retryable: bool) -> String {
    if retryable {
        format!("{} {}", base, messages.retry_hint)
    } else {
        base.to_string()
    }
}
