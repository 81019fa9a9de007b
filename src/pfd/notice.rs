use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

const NOTICE_START: &str = "<ul class='hlist' style='display: inline; margin: 0;'><onlyinclude>";
const NOTICE_END: &str = "</onlyinclude></ul>";

/// Property numbers announced on the watchlist notice, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistNotice {
    properties: Vec<String>,
}

impl WatchlistNotice {
    pub fn parse(text: &str) -> Self {
        lazy_static! {
            static ref RE_PROPERTY_RFD: Regex = Regex::new(r"\{\{\s*PropertyRFD\s*\|\s*[Pp]?(\d+)\s*\}\}")
                .expect("RE_PROPERTY_RFD does not parse");
        }
        let mut ret = Self::default();
        for caps in RE_PROPERTY_RFD.captures_iter(text) {
            ret.insert(&caps[1]);
        }
        ret
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    /// Appends the property; false if it was already listed.
    pub fn insert(&mut self, property: &str) -> bool {
        if self.contains(property) {
            return false;
        }
        self.properties.push(property.to_string());
        true
    }

    /// False if the property was not listed.
    pub fn remove(&mut self, property: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p != property);
        self.properties.len() != before
    }
}

impl fmt::Display for WatchlistNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NOTICE_START}")?;
        for property in &self.properties {
            write!(f, "{{{{PropertyRFD|{property}}}}} ")?;
        }
        write!(f, "{NOTICE_END}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<ul class='hlist' style='display: inline; margin: 0;'><onlyinclude>{{PropertyRFD|123}} {{PropertyRFD|4567}} </onlyinclude></ul>";

    #[test]
    fn test_parse() {
        let notice = WatchlistNotice::parse(PAGE);
        assert_eq!(notice.properties(), ["123", "4567"]);
        let notice = WatchlistNotice::parse("{{PropertyRFD|P9}}{{PropertyRFD| 9 }}{{PropertyRFD|x}}");
        assert_eq!(notice.properties(), ["9"]);
        assert!(WatchlistNotice::parse("").properties().is_empty());
    }

    #[test]
    fn test_render_is_stable() {
        let notice = WatchlistNotice::parse(PAGE);
        assert_eq!(notice.to_string(), PAGE);
        assert_eq!(WatchlistNotice::parse(&notice.to_string()), notice);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut notice = WatchlistNotice::parse(PAGE);
        assert!(!notice.insert("123"));
        assert!(notice.insert("89"));
        assert!(notice.remove("4567"));
        assert!(!notice.remove("4567"));
        assert_eq!(
            notice.to_string(),
            "<ul class='hlist' style='display: inline; margin: 0;'><onlyinclude>{{PropertyRFD|123}} {{PropertyRFD|89}} </onlyinclude></ul>"
        );
    }

    #[test]
    fn test_empty_notice() {
        assert_eq!(
            WatchlistNotice::default().to_string(),
            "<ul class='hlist' style='display: inline; margin: 0;'><onlyinclude></onlyinclude></ul>"
        );
    }
}
