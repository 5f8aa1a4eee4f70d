const TOPIC_CHARS: usize = 20;
const FALLBACK_STEM: &str = "book";

/// Download name for a generated PDF: the first characters of the topic with
/// whitespace runs collapsed to `_`, e.g. `A_detective_story.pdf`.
pub fn artifact_file_name(topic: &str) -> String {
    let head: String = topic.chars().take(TOPIC_CHARS).collect();
    let mut stem = String::with_capacity(head.len());
    let mut in_whitespace = false;
    for c in head.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
        } else {
            stem.push(if is_forbidden(c) { '_' } else { c });
            in_whitespace = false;
        }
    }
    if stem.trim_matches(&['_', '.'][..]).is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    format!("{stem}.pdf")
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
