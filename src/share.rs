//! Share links and social share intents.

use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub const SHARE_TITLE: &str = "3D Apparel Customizer";
pub const SHARE_TEXT: &str = "Check out my custom garment design!";
pub const COPIED_NOTICE: &str = "Link copied to clipboard!";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` the way `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// The page URL tagged with a design stamp and an ISO-8601 timestamp.
///
/// The link carries no design data; it identifies the moment it was made.
pub fn share_link(page_url: &str, now: DateTime<Utc>) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(page_url)?;
    url.query_pairs_mut()
        .append_pair("design", &now.timestamp_millis().to_string())
        .append_pair("timestamp", &now.to_rfc3339_opts(SecondsFormat::Millis, true));
    Ok(url.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Facebook,
    Twitter,
    Email,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 3] = [
        SocialPlatform::Facebook,
        SocialPlatform::Twitter,
        SocialPlatform::Email,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Email => "Email",
        }
    }

    /// Link that opens the platform's share dialog for `url`.
    pub fn intent_url(self, url: &str) -> String {
        match self {
            SocialPlatform::Facebook => format!(
                "https://www.facebook.com/sharer/sharer.php?u={}",
                encode_component(url)
            ),
            SocialPlatform::Twitter => format!(
                "https://twitter.com/intent/tweet?text={}&url={}",
                encode_component(SHARE_TEXT),
                encode_component(url)
            ),
            SocialPlatform::Email => format!(
                "mailto:?subject={}&body={}",
                encode_component(SHARE_TEXT),
                encode_component(&format!("{SHARE_TEXT}\n\n{url}"))
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn component_encoding_matches_the_browser() {
        assert_eq!(encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn share_link_appends_design_and_timestamp() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let link = share_link("https://shop.example/customize", now).unwrap();
        assert_eq!(
            link,
            "https://shop.example/customize?design=1700000000123&timestamp=2023-11-14T22%3A13%3A20.123Z"
        );
    }

    #[test]
    fn share_link_keeps_an_existing_query() {
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let link = share_link("https://shop.example/?ref=a", now).unwrap();
        assert!(link.starts_with("https://shop.example/?ref=a&design=0&timestamp="));
    }

    #[test]
    fn email_body_holds_text_and_link() {
        let intent = SocialPlatform::Email.intent_url("https://x.test/");
        assert_eq!(
            intent,
            "mailto:?subject=Check%20out%20my%20custom%20garment%20design!\
             &body=Check%20out%20my%20custom%20garment%20design!%0A%0Ahttps%3A%2F%2Fx.test%2F"
        );
    }
}
