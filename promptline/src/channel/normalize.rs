//! Line-ending normalization for text received from remote CLIs.
//!
//! Remote shells emit `\r\r\n`, `\r\n`, `\n\r` and bare `\r` more or less at
//! random. Everything is folded into plain `\n`, except a `\r` sitting at the
//! very end of the available data: the next read may turn it into `\r\n`.

/// Normalize all carriage return / line feed combinations in `data` to `\n`.
///
/// 1. Eat consecutive `\r`'s               (`a\r\r\nb` -> `a\r\nb`)
/// 2. Convert `\r\n` to `\n`               (`a\r\nb` -> `a\nb`)
/// 3. Convert `\n\r` to `\n`               (`a\n\rb` -> `a\nb`)
/// 4. Convert single `\r`'s to `\n`        (`a\rb` -> `a\nb`)
///
/// Steps 3 and 4 leave a trailing `\r` alone.
pub fn fixup_carriage_returns(data: &str) -> String {
    normalize_region(data, false)
}

/// Normalize a region that continues a buffer whose finalized part ends
/// with a newline when `after_newline` is set.
///
/// The preceding newline is needed so that a `\n` / `\r` pair split across
/// the region boundary collapses the same way it would in one piece.
pub(crate) fn normalize_region(data: &str, after_newline: bool) -> String {
    if !data.contains('\r') {
        return data.to_string();
    }

    // Step 1: collapse runs of \r
    let mut collapsed: Vec<char> = Vec::with_capacity(data.len());
    for c in data.chars() {
        if c == '\r' && collapsed.last() == Some(&'\r') {
            continue;
        }
        collapsed.push(c);
    }

    // Step 2: \r\n -> \n
    let mut crlf: Vec<char> = Vec::with_capacity(collapsed.len());
    for (i, &c) in collapsed.iter().enumerate() {
        if c == '\r' && collapsed.get(i + 1) == Some(&'\n') {
            continue;
        }
        crlf.push(c);
    }

    // Steps 3 and 4: \n\r -> \n, lone \r -> \n, both sparing a trailing \r
    let last = crlf.len().saturating_sub(1);
    let mut out = String::with_capacity(crlf.len());
    for (i, &c) in crlf.iter().enumerate() {
        if c != '\r' || i == last {
            out.push(c);
            continue;
        }
        let follows_newline = if i == 0 {
            after_newline
        } else {
            crlf[i - 1] == '\n'
        };
        if !follows_newline {
            out.push('\n');
        }
    }
    out
}

/// Escape line feeds so text can be logged on a single line.
pub fn safe_line_feeds(text: &str) -> String {
    text.replace('\n', "\\n").replace('\r', "\\r")
}
