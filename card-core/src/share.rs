//! Download names and share links.

use serde::Serialize;
use url::Url;

/// Hashtags appended to share messages.
pub const SHARE_HASHTAGS: &str = "#TechCard #DevCommunity";

/// Filename offered for a downloaded card.
///
/// `tech-card-<slug>.png`, or `tech-card.png` when the name has no usable
/// characters.
#[must_use]
pub fn download_filename(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "tech-card.png".to_string()
    } else {
        format!("tech-card-{slug}.png")
    }
}

/// Lowercase ASCII slug with single hyphens between words.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Canonical public URL of a card: `<origin>/card/<id>`.
#[must_use]
pub fn card_url(origin: &str, id: &str) -> String {
    format!("{}/card/{id}", origin.trim_end_matches('/'))
}

/// Pre-formatted share message containing the URL and hashtags.
#[must_use]
pub fn share_message(card_url: &str) -> String {
    format!("Check out my tech card! {card_url} {SHARE_HASHTAGS}")
}

/// Links handed to the share surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    /// Canonical card URL, also used for copy-to-clipboard.
    pub url: String,
    /// Message text used by every target.
    pub message: String,
    /// WhatsApp deep link.
    pub whatsapp: String,
    /// X / Twitter intent link.
    pub twitter: String,
}

impl ShareLinks {
    /// Build every share link for a card.
    #[must_use]
    pub fn new(origin: &str, id: &str) -> Self {
        let url = card_url(origin, id);
        let message = share_message(&url);
        Self {
            whatsapp: with_text("https://wa.me/", &message),
            twitter: with_text("https://twitter.com/intent/tweet", &message),
            url,
            message,
        }
    }
}

fn with_text(base: &str, text: &str) -> String {
    match Url::parse_with_params(base, &[("text", text)]) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::warn!("Failed to build share link for {base}: {e}");
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("Ada Lovelace"), "tech-card-ada-lovelace.png");
        assert_eq!(download_filename("  José  O'Neil "), "tech-card-jos-oneil.png");
        assert_eq!(download_filename(""), "tech-card.png");
        assert_eq!(download_filename("   "), "tech-card.png");
        assert_eq!(download_filename("日本"), "tech-card.png");
    }

    #[test]
    fn test_card_url() {
        assert_eq!(
            card_url("https://me.dev/", "abc123"),
            "https://me.dev/card/abc123"
        );
    }

    #[test]
    fn test_share_links_encode_message() {
        let links = ShareLinks::new("https://me.dev", "abc");
        assert_eq!(links.url, "https://me.dev/card/abc");
        assert!(links.message.contains("https://me.dev/card/abc"));
        assert!(links.message.ends_with(SHARE_HASHTAGS));
        assert!(links.whatsapp.starts_with("https://wa.me/?text="));
        assert!(links.twitter.starts_with("https://twitter.com/intent/tweet?text="));
        assert!(!links.twitter.contains(' '));
        assert!(links.twitter.contains("%23TechCard"));

        let parsed = Url::parse(&links.whatsapp).expect("valid url");
        let (_, text) = parsed.query_pairs().next().expect("text param");
        assert_eq!(text, links.message);
    }
}
