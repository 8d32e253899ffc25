/// Rewrite `\n` to `\r\n` when writing to a raw-mode terminal.
///
/// While the TUI holds the terminal in raw mode, a bare `\n` only moves the
/// cursor down without returning it to column zero. Text destined for stdout
/// must therefore be normalized when stdout is a tty; redirected output is
/// passed through untouched. Existing `\r\n` pairs are left alone.
pub fn normalize_newlines_for_terminal(text: &str, is_tty: bool) -> String {
    if !is_tty {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut prev_was_cr = false;
    for ch in text.chars() {
        if ch == '\n' && !prev_was_cr {
            out.push('\r');
        }
        out.push(ch);
        prev_was_cr = ch == '\r';
    }
    out
}
