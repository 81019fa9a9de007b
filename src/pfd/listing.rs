use std::fmt;

const PFD_PREFIX: &str = "Wikidata:Properties for deletion";
const PFD_PREFIX_UNDERSCORED: &str = "Wikidata:Properties_for_deletion";

/// Substrings marking lines that mention the listing page but are not requests.
const NON_REQUEST_MARKERS: &[&str] = &["Header", "text/", "text2/", "<!--"];

/// A line of the active section that transcludes a deletion discussion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfdRequest {
    /// The line as it appears on the listing page
    pub line: String,
    /// Discussion subpage, e.g. `Wikidata:Properties for deletion/P1234`
    pub page: String,
    /// Numeric property id, without the `P`; `None` for subpages like
    /// `P2010 and P2011`
    pub property: Option<String>,
}

impl PfdRequest {
    pub fn from_line(line: &str) -> Option<Self> {
        if !line.contains(PFD_PREFIX) && !line.contains(PFD_PREFIX_UNDERSCORED) {
            return None;
        }
        if NON_REQUEST_MARKERS.iter().any(|m| line.contains(m)) {
            return None;
        }
        let page = line
            .trim()
            .replace("{{", "")
            .replace("}}", "")
            .replace('_', " ");
        let subpage = page.split('/').nth(1)?.trim();
        if subpage.is_empty() {
            return None;
        }
        let property = Self::property_from_subpage(subpage);
        Some(Self {
            line: line.to_string(),
            page: page.trim().to_string(),
            property,
        })
    }

    fn property_from_subpage(segment: &str) -> Option<String> {
        let number = segment
            .strip_prefix('P')
            .or_else(|| segment.strip_prefix('p'))
            .unwrap_or(segment);
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(number.to_string())
    }

    pub fn property_id(&self) -> Option<String> {
        self.property.as_ref().map(|p| format!("P{p}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Request(PfdRequest),
    Other(String),
}

impl ListingLine {
    fn parse(line: &str) -> Self {
        match PfdRequest::from_line(line) {
            Some(request) => Self::Request(request),
            None => Self::Other(line.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Request(request) => &request.line,
            Self::Other(line) => line,
        }
    }
}

/// The listing page, split at the on-hold marker. Only the active section
/// is broken into lines; the marker and everything after it are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    active: Vec<ListingLine>,
    on_hold: Option<String>,
}

impl Listing {
    pub fn parse(text: &str, on_hold_marker: &str) -> Self {
        let (active, on_hold) = match text.split_once(on_hold_marker) {
            Some((active, rest)) => (active, Some(format!("{on_hold_marker}{rest}"))),
            None => (text, None),
        };
        Self {
            active: active.split('\n').map(ListingLine::parse).collect(),
            on_hold,
        }
    }

    pub fn requests(&self) -> Vec<PfdRequest> {
        self.active
            .iter()
            .filter_map(|line| match line {
                ListingLine::Request(request) => Some(request.to_owned()),
                ListingLine::Other(_) => None,
            })
            .collect()
    }

    pub fn lines(&self) -> &[ListingLine] {
        &self.active
    }

    /// Drops the request's line; returns false if it was not listed.
    pub fn remove(&mut self, request: &PfdRequest) -> bool {
        let before = self.active.len();
        self.active
            .retain(|line| !matches!(line, ListingLine::Request(r) if r == request));
        self.active.len() != before
    }

    /// Rewrites underscored links to the listing page in the active section.
    pub fn tidy(&mut self) {
        for line in self.active.iter_mut() {
            let text = match line {
                ListingLine::Request(request) => &mut request.line,
                ListingLine::Other(text) => text,
            };
            if text.contains(PFD_PREFIX_UNDERSCORED) {
                *text = text.replace(PFD_PREFIX_UNDERSCORED, PFD_PREFIX);
            }
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<&str> = self.active.iter().map(ListingLine::as_str).collect();
        write!(f, "{}", active.join("\n"))?;
        if let Some(on_hold) = &self.on_hold {
            write!(f, "{on_hold}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "<!-- on hold -->";

    fn listing_text() -> String {
        [
            "{{Wikidata:Properties for deletion/Header}}",
            "<!-- Add new requests at the bottom -->",
            "{{Wikidata:Properties for deletion/P1234}}",
            "{{Wikidata:Properties_for_deletion/p5678}}",
            "{{Wikidata:Properties for deletion/text/intro}}",
            "Some remark about [[Wikidata:Properties for deletion]]",
            "",
            MARKER,
            "{{Wikidata:Properties for deletion/P42}}",
            "",
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_requests() {
        let listing = Listing::parse(&listing_text(), MARKER);
        let requests = listing.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].page, "Wikidata:Properties for deletion/P1234");
        assert_eq!(requests[0].property.as_deref(), Some("1234"));
        assert_eq!(requests[0].property_id().as_deref(), Some("P1234"));
        assert_eq!(requests[1].page, "Wikidata:Properties for deletion/p5678");
        assert_eq!(requests[1].property.as_deref(), Some("5678"));
        assert_eq!(listing.lines().len(), 8);
    }

    #[test]
    fn test_unmodified_listing_renders_verbatim() {
        let text = listing_text();
        assert_eq!(Listing::parse(&text, MARKER).to_string(), text);
        let text = "no marker here\n{{Wikidata:Properties for deletion/P1}}\n";
        assert_eq!(Listing::parse(text, MARKER).to_string(), text);
    }

    #[test]
    fn test_remove_request() {
        let mut listing = Listing::parse(&listing_text(), MARKER);
        let request = listing.requests()[0].clone();
        assert!(listing.remove(&request));
        assert!(!listing.remove(&request));
        let text = listing.to_string();
        assert!(!text.contains("P1234"));
        assert!(text.contains("{{Wikidata:Properties for deletion/P42}}"));
        assert_eq!(listing.requests().len(), 1);
    }

    #[test]
    fn test_tidy_underscores() {
        let mut listing = Listing::parse(&listing_text(), MARKER);
        listing.tidy();
        let text = listing.to_string();
        assert!(text.contains("{{Wikidata:Properties for deletion/p5678}}"));
        assert!(!text.contains("Properties_for_deletion"));
    }

    #[test]
    fn test_subpage_without_single_property() {
        let request =
            PfdRequest::from_line("{{Wikidata:Properties for deletion/P2010 and P2011}}").unwrap();
        assert_eq!(request.page, "Wikidata:Properties for deletion/P2010 and P2011");
        assert_eq!(request.property, None);
        assert_eq!(request.property_id(), None);
        let request = PfdRequest::from_line("{{Wikidata:Properties for deletion/P12 (2)}}").unwrap();
        assert_eq!(request.property, None);
    }

    #[test]
    fn test_lines_without_subpage_are_not_requests() {
        assert!(PfdRequest::from_line("{{Wikidata:Properties for deletion}}").is_none());
        assert!(PfdRequest::from_line("{{Wikidata:Properties for deletion/}}").is_none());
        assert!(PfdRequest::from_line("{{Something else/P12}}").is_none());
    }
}
