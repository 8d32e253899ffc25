/// Greedy word wrap used for commit message bodies.
///
/// Words are packed onto a line until the next word would exceed `width`;
/// a single word longer than `width` is emitted on its own line unbroken (no
/// hyphenation). Blank-line paragraph separators are preserved. Joining the
/// output with whitespace and re-tokenizing yields the input's token
/// sequence.
pub fn wrap_text(text: &str, width: usize) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(|paragraph| wrap_paragraph(paragraph, width))
        .collect();
    paragraphs.join("\n\n")
}

fn wrap_paragraph(paragraph: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        if current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(wrap_text("", 72), "");
        assert_eq!(wrap_text("   \n ", 72), "");
    }

    #[test]
    fn wraps_at_boundary() {
        let wrapped = wrap_text(
            "Lorem ipsum dolor sit amet consectetur adipiscing elit",
            20,
        );
        for line in wrapped.lines() {
            assert!(line.chars().count() <= 20, "line too long: {line:?}");
        }
        assert_eq!(wrapped.lines().next(), Some("Lorem ipsum dolor"));
    }

    #[test]
    fn preserves_token_sequence() {
        let input = "one two three four five six seven eight nine ten";
        let wrapped = wrap_text(input, 12);
        let round_trip: Vec<&str> = wrapped.split_whitespace().collect();
        let original: Vec<&str> = input.split_whitespace().collect();
        assert_eq!(round_trip, original);
    }

    #[test]
    fn oversized_token_is_emitted_as_is() {
        let token = "a".repeat(40);
        let wrapped = wrap_text(&format!("x {token} y"), 10);
        assert!(wrapped.lines().any(|line| line == token));
    }

    #[test]
    fn paragraph_separators_survive() {
        let wrapped = wrap_text("first paragraph here\n\nsecond paragraph here", 72);
        assert_eq!(wrapped, "first paragraph here\n\nsecond paragraph here");
    }
}
