//! Version extraction from the handful of source formats we read.
//!
//! Each extractor returns the first occurrence that fully matches, or `None`.
//! Values are never validated beyond the shape of the surrounding assignment.

const APP_VERSION_ANCHOR: &str = "export const APP_VERSION = ";
const VERSION_NAME_ANCHOR: &str = "versionName";
const MARKETING_VERSION_ANCHOR: &str = "MARKETING_VERSION";

/// `export const APP_VERSION = '<value>'` (single or double quotes).
pub fn extract_app_version(content: &str) -> Option<&str> {
    first_match(content, APP_VERSION_ANCHOR, quoted_value)
}

/// `versionName = "<value>"` from an Android `build.gradle`.
pub fn extract_version_name(content: &str) -> Option<&str> {
    first_match(content, VERSION_NAME_ANCHOR, |rest| {
        let rest = rest.trim_start().strip_prefix('=')?;
        quoted_value(rest.trim_start())
    })
}

/// `MARKETING_VERSION = <value>;` from an Xcode `project.pbxproj`.
pub fn extract_marketing_version(content: &str) -> Option<&str> {
    first_match(content, MARKETING_VERSION_ANCHOR, |rest| {
        let rest = rest.trim_start().strip_prefix('=')?.trim_start();
        let end = rest
            .find(|c: char| !is_marketing_char(c))
            .unwrap_or(rest.len());
        if end == 0 || !rest[end..].starts_with(';') {
            return None;
        }
        Some(&rest[..end])
    })
}

fn first_match<'a>(
    content: &'a str,
    anchor: &str,
    tail: impl Fn(&'a str) -> Option<&'a str>,
) -> Option<&'a str> {
    content
        .match_indices(anchor)
        .find_map(|(idx, _)| tail(&content[idx + anchor.len()..]))
}

fn quoted_value(rest: &str) -> Option<&str> {
    let open = rest.chars().next().filter(|c| is_quote(*c))?;
    let body = &rest[open.len_utf8()..];
    let end = body.find(is_quote)?;
    if end == 0 {
        return None;
    }
    Some(&body[..end])
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

fn is_marketing_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}
