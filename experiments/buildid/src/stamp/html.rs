//! Meta tags and inline script carrying the build identity in a shipped HTML
//! document.
//!
//! The stamp lives in a marked block placed just before `</head>`:
//!
//! ```html
//! <!-- buildid:begin -->
//! <meta name="build-id" content="20261014-093005" />
//! <meta name="commit-sha" content="622a34a..." />
//! <script id="build-info">window.__BUILD_INFO__ = {"buildId":"...","commitSha":"..."};</script>
//! <!-- buildid:end -->
//! ```
//!
//! Injection first strips any earlier block plus stray `build-id` /
//! `commit-sha` meta tags and `build-info` scripts (template leftovers such as
//! `content="%REACT_APP_BUILD_ID%"`), then inserts a fresh block.

use anyhow::{bail, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::identity::BuildIdentity;

pub const BUILD_ID_META: &str = "build-id";
pub const COMMIT_SHA_META: &str = "commit-sha";
pub const SCRIPT_ID: &str = "build-info";
pub const GLOBAL_NAME: &str = "window.__BUILD_INFO__";

const BLOCK_BEGIN: &str = "<!-- buildid:begin -->";
const BLOCK_END: &str = "<!-- buildid:end -->";

struct Patterns {
    block: Regex,
    stray_meta: Regex,
    stray_script: Regex,
    head_close: Regex,
    meta_tag: Regex,
    content_attr: Regex,
    script: Regex,
    assignment: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |re: &str| Regex::new(re).expect("HTML stamp pattern is a valid regex");
        Patterns {
            block: compile(r"(?s)[ \t]*<!-- buildid:begin -->.*?<!-- buildid:end -->[ \t]*\r?\n?"),
            stray_meta: compile(
                r#"(?i)[ \t]*<meta\b[^>]*\bname\s*=\s*["'](?:build-id|commit-sha)["'][^>]*>[ \t]*\r?\n?"#,
            ),
            stray_script: compile(
                r#"(?is)[ \t]*<script\b[^>]*\bid\s*=\s*["']build-info["'][^>]*>.*?</script\s*>[ \t]*\r?\n?"#,
            ),
            head_close: compile(r"(?i)</head\s*>"),
            meta_tag: compile(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']([A-Za-z-]+)["'][^>]*>"#),
            content_attr: compile(r#"(?i)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#),
            script: compile(
                r#"(?is)<script\b[^>]*\bid\s*=\s*["']build-info["'][^>]*>(.*?)</script\s*>"#,
            ),
            assignment: compile(r"(?s)^\s*window\.__BUILD_INFO__\s*=\s*(\{.*\})\s*;?\s*$"),
        }
    })
}

/// Stamp `identity` into `document`, replacing any earlier stamp
pub fn inject(document: &str, identity: &BuildIdentity) -> Result<String> {
    let p = patterns();
    let stripped = p.block.replace_all(document, "");
    let stripped = p.stray_meta.replace_all(&stripped, "");
    let stripped = p.stray_script.replace_all(&stripped, "").into_owned();

    let Some(head_close) = p.head_close.find(&stripped) else {
        bail!("document has no </head> element");
    };

    // When `</head>` sits on its own line, indent the block one level deeper
    let line_start = stripped[..head_close.start()].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &stripped[line_start..head_close.start()];
    let (insert_at, indent) = if prefix.chars().all(|c| c == ' ' || c == '\t') {
        (line_start, format!("{prefix}  "))
    } else {
        (head_close.start(), String::new())
    };

    let block = render_block(identity, &indent)?;
    let mut out = String::with_capacity(stripped.len() + block.len());
    out.push_str(&stripped[..insert_at]);
    out.push_str(&block);
    out.push_str(&stripped[insert_at..]);
    Ok(out)
}

fn render_block(identity: &BuildIdentity, indent: &str) -> Result<String> {
    // `<` escaped so the literal can never close the script element
    let json = serde_json::to_string(identity)?.replace('<', "\\u003c");
    let build_id = escape_attr(identity.build_id());
    let commit_sha = escape_attr(identity.commit_sha());
    Ok(format!(
        "{indent}{BLOCK_BEGIN}\n\
         {indent}<meta name=\"{BUILD_ID_META}\" content=\"{build_id}\" />\n\
         {indent}<meta name=\"{COMMIT_SHA_META}\" content=\"{commit_sha}\" />\n\
         {indent}<script id=\"{SCRIPT_ID}\">{GLOBAL_NAME} = {json};</script>\n\
         {indent}{BLOCK_END}\n"
    ))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Fields of the inline `build-info` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInfo {
    pub build_id: Option<String>,
    pub commit_sha: Option<String>,
}

/// Whatever stamp values a document carries; each field is independent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlStamp {
    pub build_id_meta: Option<String>,
    pub commit_sha_meta: Option<String>,
    /// `None` when there is no `build-info` script, `Some(Err)` when its
    /// contents are not a parseable object
    pub script: Option<Result<ScriptInfo, String>>,
}

/// Pull the stamp values out of a document without judging them
#[must_use]
pub fn extract(document: &str) -> HtmlStamp {
    let p = patterns();
    let mut stamp = HtmlStamp::default();

    for caps in p.meta_tag.captures_iter(document) {
        let slot = match caps[1].to_ascii_lowercase().as_str() {
            BUILD_ID_META => &mut stamp.build_id_meta,
            COMMIT_SHA_META => &mut stamp.commit_sha_meta,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }
        let content = p.content_attr.captures(&caps[0]).and_then(|c| c.get(1).or_else(|| c.get(2)));
        *slot = Some(content.map_or_else(String::new, |m| unescape_attr(m.as_str())));
    }

    stamp.script = p.script.captures(document).map(|caps| parse_script(&caps[1]));
    stamp
}

fn parse_script(body: &str) -> Result<ScriptInfo, String> {
    let Some(caps) = patterns().assignment.captures(body) else {
        return Err(format!("expected `{GLOBAL_NAME} = {{...}}`"));
    };
    serde_json::from_str(&caps[1]).map_err(|e| format!("invalid object literal: {e}"))
}
