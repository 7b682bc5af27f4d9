use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::dom::{Document, NodeId};

const EMBED_BASE: &str = "https://www.youtube.com/embed/";
const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("malformed video URL '{input}': {reason}")]
    MalformedUrl { input: String, reason: &'static str },
    #[error("unsupported video host '{host}'")]
    UnsupportedHost { host: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRef {
    pub video_id: String,
}

impl EmbedRef {
    pub fn embed_url(&self) -> String {
        format!("{EMBED_BASE}{}", self.video_id)
    }
}

/// Extracts the video id from watch, short-link, embed and shorts URLs.
pub fn parse_video_url(input: &str) -> Result<EmbedRef, EmbedError> {
    let malformed = |reason| EmbedError::MalformedUrl {
        input: input.to_string(),
        reason,
    };
    let url = Url::parse(input.trim()).map_err(|_| malformed("not an absolute URL"))?;
    let host = url
        .host_str()
        .ok_or_else(|| malformed("missing host"))?
        .to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host);

    let mut segments = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed") | Some("shorts") => segments.next().map(str::to_string),
            _ => None,
        },
        other => {
            return Err(EmbedError::UnsupportedHost {
                host: other.to_string(),
            })
        }
    };

    let video_id = candidate.ok_or_else(|| malformed("no video id"))?;
    if !is_valid_video_id(&video_id) {
        return Err(malformed("invalid video id"));
    }
    Ok(EmbedRef { video_id })
}

fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone)]
pub struct YouTubeEmbed {
    host: NodeId,
    embed: Option<EmbedRef>,
}

impl YouTubeEmbed {
    pub const TAG: &'static str = "youtube-embed";
    pub const URL_ATTRIBUTE: &'static str = "data-url";

    pub fn new(host: NodeId) -> Self {
        Self { host, embed: None }
    }

    pub fn observed_attributes() -> &'static [&'static str] {
        &[Self::URL_ATTRIBUTE]
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn embed(&self) -> Option<&EmbedRef> {
        self.embed.as_ref()
    }

    pub fn set_url(&mut self, doc: &mut Document, url: &str) {
        let old = doc
            .get_attribute(self.host, Self::URL_ATTRIBUTE)
            .map(str::to_string);
        doc.set_attribute(self.host, Self::URL_ATTRIBUTE, url);
        self.attribute_changed_callback(doc, Self::URL_ATTRIBUTE, old.as_deref(), Some(url));
    }

    /// Never fails: malformed URLs are logged and leave the host empty.
    pub fn attribute_changed_callback(
        &mut self,
        doc: &mut Document,
        name: &str,
        _old: Option<&str>,
        new: Option<&str>,
    ) {
        if name != Self::URL_ATTRIBUTE {
            return;
        }
        doc.clear_children(self.host);
        self.embed = None;

        let Some(raw) = new.filter(|v| !v.trim().is_empty()) else {
            debug!("Video URL cleared");
            return;
        };
        match parse_video_url(raw) {
            Ok(embed) => {
                let iframe = doc.append_element(self.host, "iframe");
                doc.set_attribute(iframe, "src", &embed.embed_url());
                doc.set_attribute(iframe, "allowfullscreen", "");
                debug!("Embedding video {}", embed.video_id);
                self.embed = Some(embed);
            }
            Err(e) => warn!("Ignoring video URL: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_supported_url_form() {
        let forms = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ];
        for form in forms {
            let embed = parse_video_url(form).unwrap_or_else(|e| panic!("{form}: {e}"));
            assert_eq!(embed.video_id, "dQw4w9WgXcQ");
        }
    }

    #[test]
    fn rejects_malformed_and_foreign_urls() {
        assert!(matches!(
            parse_video_url("not a url"),
            Err(EmbedError::MalformedUrl { .. })
        ));
        assert!(matches!(
            parse_video_url("https://www.youtube.com/watch?v=short"),
            Err(EmbedError::MalformedUrl { .. })
        ));
        assert!(matches!(
            parse_video_url("https://www.youtube.com/watch"),
            Err(EmbedError::MalformedUrl { .. })
        ));
        assert_eq!(
            parse_video_url("https://vimeo.com/123456"),
            Err(EmbedError::UnsupportedHost {
                host: "vimeo.com".to_string()
            })
        );
    }

    #[test]
    fn attribute_change_renders_and_clears_iframe() {
        let mut doc = Document::new();
        let host = doc.create_element(YouTubeEmbed::TAG);
        let mut embed = YouTubeEmbed::new(host);

        embed.set_url(&mut doc, "https://youtu.be/dQw4w9WgXcQ");
        let iframe = doc.query_selector(host, "iframe").expect("iframe");
        assert_eq!(
            doc.get_attribute(iframe, "src"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );

        embed.set_url(&mut doc, "https://example.com/clip");
        assert!(doc.query_selector(host, "iframe").is_none());
        assert!(embed.embed().is_none());
    }

    #[test]
    fn ignores_unobserved_attributes() {
        let mut doc = Document::new();
        let host = doc.create_element(YouTubeEmbed::TAG);
        let mut embed = YouTubeEmbed::new(host);
        embed.attribute_changed_callback(
            &mut doc,
            "data-title",
            None,
            Some("https://youtu.be/dQw4w9WgXcQ"),
        );
        assert!(embed.embed().is_none());
    }
}
