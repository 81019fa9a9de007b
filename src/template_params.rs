use crate::wikitext::TemplateInvocation;

/// Picks one argument out of the invocations of a template.
///
/// `template` is matched as a substring of the invocation title, `key` as
/// `key=` anywhere in a parameter (so `"id"` also matches `imdb_id=`).
/// When `positional` is set, a parameter without `=` is taken as the value
/// as long as nothing was picked before it. The first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterMatcher<'a> {
    template: &'a str,
    key: &'a str,
    positional: bool,
}

impl<'a> ParameterMatcher<'a> {
    pub const fn named(template: &'a str, key: &'a str) -> Self {
        Self {
            template,
            key,
            positional: false,
        }
    }

    pub const fn named_or_positional(template: &'a str, key: &'a str) -> Self {
        Self {
            template,
            key,
            positional: true,
        }
    }

    /// Returns the matched, trimmed value; `None` when nothing matches.
    pub fn extract(&self, templates: &[TemplateInvocation]) -> Option<String> {
        let key_eq = format!("{}=", self.key);
        templates
            .iter()
            .filter(|t| t.title.contains(self.template))
            .flat_map(|t| t.params.iter())
            .find_map(|param| {
                let value = match param.split_once('=') {
                    None if self.positional => param.trim(),
                    Some((_, value)) if param.contains(&key_eq) => value.trim(),
                    _ => return None,
                };
                (!value.is_empty()).then(|| value.to_string())
            })
    }
}
