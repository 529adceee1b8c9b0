//! Console output for the interactive surface.
//!
//! Stages announce themselves with a one-line status; longer text is
//! wrapped on word boundaries. Everything goes to stdout, logs go to stderr.

use std::io::Write;

/// Wrap width for [`say`].
const WIDTH: usize = 100;

/// Print a brief, one-line status with a role prefix.
pub fn status(role: &str, emoji: &str, text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "[{role}] {emoji} {text}");
}

/// Print a block of text with a role prefix, wrapped for the terminal.
pub fn say(role: &str, text: &str) {
    let mut out = std::io::stdout().lock();
    for line in wrap_lines(text, WIDTH) {
        let _ = writeln!(out, "[{role}] {line}");
    }
}

/// Print an error line.
pub fn error(role: &str, text: &str) {
    status(role, "❌", text);
}

/// Wrap text into lines of max_len, breaking on word boundaries.
fn wrap_lines(text: &str, max_len: usize) -> Vec<String> {
    let mut result = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_len {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            if current.chars().count() + word.chars().count() + 1 > max_len {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_pass_through() {
        assert_eq!(wrap_lines("a\n\nb", 10), ["a", "", "b"]);
    }

    #[test]
    fn long_lines_break_on_words() {
        let wrapped = wrap_lines("alpha beta gamma delta", 11);
        assert_eq!(wrapped, ["alpha beta", "gamma delta"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let wrapped = wrap_lines("tiny enormousword x", 8);
        assert_eq!(wrapped, ["tiny", "enormousword", "x"]);
    }
}
