//! ASCII sanitation of emitted text

/// Typographic characters and their ASCII replacements
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2192}', "->"),
    ('\u{2190}', "<-"),
    ('\u{2191}', "^"),
    ('\u{2193}', "v"),
    ('\u{2022}', "*"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2026}', "..."),
    ('\u{00a0}', " "),
];

/// Maps text to plain ASCII
///
/// Known typographic characters get an ASCII equivalent; every other run of
/// non-ASCII characters collapses to a single space.
///
/// # Example
///
/// ```
/// use depthcrawl::output::sanitize_text;
///
/// assert_eq!(sanitize_text("Next \u{2192} \u{201c}quoted\u{201d}\u{2026}"), "Next -> \"quoted\"...");
/// assert_eq!(sanitize_text("caf\u{e9}s"), "caf s");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_non_ascii_run = false;

    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
            in_non_ascii_run = false;
        } else if let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
            in_non_ascii_run = false;
        } else if !in_non_ascii_run {
            out.push(' ');
            in_non_ascii_run = true;
        }
    }

    out
}
