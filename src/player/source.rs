use std::fmt;

use url::Url;

use crate::error::PlayerError;

/// The immutable URL of the live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    url: Url,
}

impl StreamSource {
    /// Validates `raw` as an absolute http(s) URL with a host.
    pub fn parse(raw: &str) -> Result<Self, PlayerError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PlayerError::InvalidConfiguration("stream URL is empty".into()));
        }

        let url = Url::parse(raw)
            .map_err(|e| PlayerError::InvalidConfiguration(format!("{}: {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(PlayerError::InvalidConfiguration(format!(
                    "unsupported scheme '{}' in {}",
                    other, raw
                )))
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(PlayerError::InvalidConfiguration(format!("{} has no host", raw)));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        let source = StreamSource::parse("http://radio.example.com:8000/live").unwrap();
        assert_eq!(source.url().port(), Some(8000));
        assert!(StreamSource::parse("https://radio.example.com/live.mp3").is_ok());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let source = StreamSource::parse("  http://radio.example.com/live \n").unwrap();
        assert_eq!(source.as_str(), "http://radio.example.com/live");
    }

    #[test]
    fn rejects_empty_url() {
        assert!(matches!(
            StreamSource::parse("   "),
            Err(PlayerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_relative_and_foreign_urls() {
        assert!(StreamSource::parse("/live.mp3").is_err());
        assert!(StreamSource::parse("ftp://radio.example.com/live").is_err());
        assert!(StreamSource::parse("not a url").is_err());
    }
}
