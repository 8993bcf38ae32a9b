/// Heading layout: each `\n`-separated part is split into lines of at most `words_per_line` words.
pub fn wrap_heading(text: &str, words_per_line: usize) -> Vec<String> {
    let per_line = words_per_line.max(1);
    let mut lines = Vec::new();
    for part in text.split('\n') {
        let words: Vec<&str> = part.split_whitespace().collect();
        for chunk in words.chunks(per_line) {
            lines.push(chunk.join(" "));
        }
    }
    lines
}

/// Greedy caption wrap at `max_chars` characters. A word longer than the limit gets its own line.
pub fn wrap_caption(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if line_chars > 0 && line_chars + 1 + word_chars > max_chars {
            lines.push(std::mem::take(&mut line));
            line_chars = 0;
        }
        if line_chars > 0 {
            line.push(' ');
            line_chars += 1;
        }
        line.push_str(word);
        line_chars += word_chars;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/wrap.rs"]
mod tests;
