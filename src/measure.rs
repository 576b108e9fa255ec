use unicode_width::UnicodeWidthStr;

/// Display width of `text` in terminal columns.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Break a multi-word label into lines no wider than `max_width`.
///
/// Single-word labels and labels that already fit are returned unchanged.
/// A single word wider than `max_width` gets its own line.
pub fn wrap_label(label: &str, max_width: usize) -> String {
    if !label.contains(' ') || text_width(label) <= max_width {
        return label.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in label.split(' ') {
        let current_width = text_width(&current);
        if !current.is_empty() && current_width + text_width(word) + 1 > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else if current.is_empty() {
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}
