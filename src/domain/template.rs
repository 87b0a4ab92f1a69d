//! `{}` placeholder substitution for message templates.
//!
//! Each `{}` in the template is replaced by the next argument's `Display`
//! output. Placeholders without a matching argument are kept verbatim and
//! surplus arguments are ignored, so a malformed call still produces a line.

use std::borrow::Cow;
use std::fmt::{Display, Write};

const PLACEHOLDER: &str = "{}";

/// Render `template` with `args`.
///
/// Borrows the template unchanged when there is nothing to substitute.
///
/// # Example
/// ```
/// use rate_limited_log::format_template;
///
/// let msg = format_template("saw {} events of type {}", &[&3, &"click"]);
/// assert_eq!(msg, "saw 3 events of type click");
/// ```
pub fn format_template<'a>(template: &'a str, args: &[&dyn Display]) -> Cow<'a, str> {
    if args.is_empty() || !template.contains(PLACEHOLDER) {
        return Cow::Borrowed(template);
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut rest = template;
    let mut args = args.iter();

    while let Some(pos) = rest.find(PLACEHOLDER) {
        out.push_str(&rest[..pos]);
        match args.next() {
            // Writing into a String cannot fail.
            Some(arg) => {
                let _ = write!(out, "{}", arg);
            }
            None => out.push_str(PLACEHOLDER),
        }
        rest = &rest[pos + PLACEHOLDER.len()..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}
