use reqwest::Url;

/// Marker the assistant puts in front of a generated document's URL
pub const LINK_MARKER: &str = "link: ";

/// Label shown in place of the raw document URL
pub const LINK_LABEL: &str = "generated your document";

/// How a message's text should be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedContent<'a> {
    Plain(&'a str),
    /// Text before the marker, followed by a link to `url`
    DocumentLink { text: &'a str, url: &'a str },
}

impl<'a> RenderedContent<'a> {
    pub fn url(&self) -> Option<&'a str> {
        match self {
            RenderedContent::Plain(_) => None,
            RenderedContent::DocumentLink { url, .. } => Some(url),
        }
    }

    /// The document URL if it is an http(s) address. Anything else is never
    /// handed to a browser.
    pub fn web_url(&self) -> Option<Url> {
        let raw = self.url()?;
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            _ => {
                log::warn!("[content] ignoring non-web document link {:?}", raw);
                None
            }
        }
    }
}

/// Split message content at the first link marker
pub fn render(content: &str) -> RenderedContent<'_> {
    match content.split_once(LINK_MARKER) {
        Some((text, url)) => RenderedContent::DocumentLink {
            text,
            url: url.trim(),
        },
        None => RenderedContent::Plain(content),
    }
}
