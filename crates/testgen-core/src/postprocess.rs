//! Cleanup applied to raw model output before it is saved.

/// Remove a surrounding Markdown code fence (with or without an info string) and trim.
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with("```") {
        text = match text.split_once('\n') {
            Some((_, rest)) => rest,
            None => text.trim_start_matches('`'),
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }

    text.trim().to_owned()
}

/// Insert a `{tag} Generated` line for every tag in `required` that `code` lacks.
///
/// Lines are inserted right after the first `/**`, in `required` order. When the code
/// has no doc comment at all, an empty one is prepended first. Never fails.
#[must_use]
pub fn ensure_doc_tags(code: &str, required: &[String]) -> String {
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|tag| !code.contains(tag))
        .collect();
    if missing.is_empty() {
        return code.to_owned();
    }

    let mut out = if code.contains("/**") {
        code.to_owned()
    } else {
        format!("/**\n */\n{code}")
    };

    let insert_at = out.find("/**").map_or(0, |pos| pos + 3);
    let lines: String = missing
        .iter()
        .map(|tag| format!("\n * {tag} Generated"))
        .collect();
    out.insert_str(insert_at, &lines);
    out
}
