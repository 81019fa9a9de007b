use lazy_static::lazy_static;
use regex::Regex;

/// Namespace prefixes that are kept as-is when a template is invoked with an
/// explicit namespace, e.g. `{{Wikipedia:Foo}}`.
const NAMESPACE_PREFIXES: &[&str] = &[
    "Template",
    "Category",
    "Wikipedia",
    "Wikidata",
    "Project",
    "Portal",
    "Module",
    "User",
    "Help",
    "File",
    "Draft",
];

const MAGIC_WORDS: &[&str] = &[
    "PAGENAME",
    "PAGENAMEE",
    "FULLPAGENAME",
    "BASEPAGENAME",
    "SUBPAGENAME",
    "NAMESPACE",
    "SITENAME",
    "CURRENTYEAR",
    "CURRENTMONTH",
    "CURRENTDAY",
    "CURRENTTIMESTAMP",
    "!",
    "=",
];

/// One transclusion found in wikitext: the normalised template title and its
/// parameters in order. Named parameters are kept as `key=value`, positional
/// ones as the bare value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateInvocation {
    pub title: String,
    pub params: Vec<String>,
}

impl TemplateInvocation {
    pub fn new(title: &str, params: &[&str]) -> Self {
        Self {
            title: normalize_template_title(title).unwrap_or_else(|| title.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Spaces instead of underscores, collapsed whitespace, upper-case first
/// letter of the namespace and of the page name.
pub fn normalize_title(title: &str) -> String {
    let title = title.replace('_', " ");
    let title = title.split_whitespace().collect::<Vec<&str>>().join(" ");
    if let Some((prefix, rest)) = title.split_once(':') {
        let prefix = capitalize(prefix.trim());
        if NAMESPACE_PREFIXES.contains(&prefix.as_str()) {
            return format!("{prefix}:{}", capitalize(rest.trim()));
        }
    }
    capitalize(&title)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Turns the name part of a `{{...}}` into a full page title.
/// Returns `None` for parser functions, magic words and empty names.
pub fn normalize_template_title(name: &str) -> Option<String> {
    let mut name = name.trim();
    for prefix in ["subst:", "safesubst:", "SUBST:", "SAFESUBST:"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest.trim();
        }
    }
    if name.is_empty() || name.starts_with('#') || name.starts_with('{') {
        return None;
    }
    if let Some(rest) = name.strip_prefix(':') {
        return Some(normalize_title(rest));
    }
    if let Some((prefix, rest)) = name.split_once(':') {
        let prefix = capitalize(prefix.trim());
        if NAMESPACE_PREFIXES.contains(&prefix.as_str()) {
            return Some(format!("{prefix}:{}", normalize_title(rest)));
        }
        // DISPLAYTITLE:, DEFAULTSORT:, lc: and friends
        return None;
    }
    if MAGIC_WORDS.contains(&name) {
        return None;
    }
    Some(format!("Template:{}", normalize_title(name)))
}

pub fn strip_comments(text: &str) -> String {
    lazy_static! {
        static ref RE_COMMENT: Regex =
            Regex::new(r"(?s)<!--.*?-->").expect("RE_COMMENT does not parse");
    }
    RE_COMMENT.replace_all(text, "").to_string()
}

/// Finds all template invocations in `text`, including nested ones, in the
/// order in which they start.
pub fn parse_templates(text: &str) -> Vec<TemplateInvocation> {
    let text = strip_comments(text);
    let bytes = text.as_bytes();
    let mut open: Vec<usize> = vec![];
    let mut found: Vec<(usize, TemplateInvocation)> = vec![];
    let mut pos = 0;
    while pos + 1 < bytes.len() {
        match (bytes[pos], bytes[pos + 1]) {
            (b'{', b'{') => {
                open.push(pos);
                pos += 2;
            }
            (b'}', b'}') => {
                if let Some(start) = open.pop() {
                    if let Some(invocation) = parse_invocation(&text[start + 2..pos]) {
                        found.push((start, invocation));
                    }
                }
                pos += 2;
            }
            _ => pos += 1,
        }
    }
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, invocation)| invocation).collect()
}

fn parse_invocation(body: &str) -> Option<TemplateInvocation> {
    let mut parts = split_top_level(body).into_iter();
    let title = normalize_template_title(&parts.next()?)?;
    let params = parts.map(|p| tidy_parameter(&p)).collect();
    Some(TemplateInvocation { title, params })
}

/// `key = value` becomes `key=value`; positional values are trimmed.
fn tidy_parameter(param: &str) -> String {
    match param.split_once('=') {
        Some((key, value)) => format!("{}={}", key.trim(), value.trim()),
        None => param.trim().to_string(),
    }
}

/// Splits on `|` that are not inside nested `{{ }}` or `[[ ]]`.
fn split_top_level(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut parts = vec![];
    let mut depth_braces = 0usize;
    let mut depth_brackets = 0usize;
    let mut last = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        let next = bytes.get(pos + 1).copied();
        match (bytes[pos], next) {
            (b'{', Some(b'{')) => {
                depth_braces += 1;
                pos += 2;
            }
            (b'}', Some(b'}')) => {
                depth_braces = depth_braces.saturating_sub(1);
                pos += 2;
            }
            (b'[', Some(b'[')) => {
                depth_brackets += 1;
                pos += 2;
            }
            (b']', Some(b']')) => {
                depth_brackets = depth_brackets.saturating_sub(1);
                pos += 2;
            }
            (b'|', _) if depth_braces == 0 && depth_brackets == 0 => {
                parts.push(body[last..pos].to_string());
                pos += 1;
                last = pos;
            }
            _ => pos += 1,
        }
    }
    parts.push(body[last..].to_string());
    parts
}
