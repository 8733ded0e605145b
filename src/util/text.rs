/// Removes one surrounding Markdown code fence (with or without a language tag)
/// and trims the result. Text without a fence is only trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Skip the language tag on the opening line, e.g. ```sql
    match body.find('\n') {
        Some(newline) if !body[..newline].trim().contains(' ') => body[newline + 1..].trim(),
        _ => body.trim(),
    }
}
