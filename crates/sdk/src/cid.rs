use std::{borrow::Cow, fmt, str::FromStr};

use crate::Error;

/// Separator between the service type tag and the service-specific id.
pub const SEPARATOR: char = ':';

/// Service type tag of YouTube videos.
pub const YOUTUBE_TAG: &str = "yt";

const HEX_PREFIX: &str = "0x";

/// The service a content identifier points into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(
    serde,
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub enum ServiceType {
    /// YouTube videos.
    #[default]
    Youtube,
    /// Any other service, keyed by its tag.
    Other(String),
}

impl ServiceType {
    /// Get the service type for a tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            YOUTUBE_TAG => Self::Youtube,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the tag.
    pub fn tag(&self) -> &str {
        match self {
            Self::Youtube => YOUTUBE_TAG,
            Self::Other(tag) => tag,
        }
    }

    /// Watch URL of the given service-specific id, if the service has one.
    pub fn watch_url(&self, id: &str) -> Option<String> {
        match self {
            Self::Youtube => Some(format!("https://www.youtube.com/watch?v={id}")),
            Self::Other(_) => None,
        }
    }

    /// Embed URL of the given service-specific id, if the service has one.
    pub fn embed_url(&self, id: &str) -> Option<String> {
        match self {
            Self::Youtube => Some(format!("https://www.youtube.com/embed/{id}")),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ServiceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::custom("empty service type"));
        }
        Ok(Self::from_tag(s))
    }
}

/// Decode a content identifier into its service type and service-specific id.
///
/// Accepts both the plain `<type>:<id>` form and its hex encoding (with or
/// without the `0x` prefix). Trailing NUL bytes of the hex form are ignored
/// since identifiers are stored in fixed-width fields on chain.
pub fn parse_cid(cid: &str) -> crate::Result<(ServiceType, String)> {
    let payload = decode_payload(cid)?;
    let (tag, id) = payload
        .split_once(SEPARATOR)
        .ok_or_else(|| Error::parse(cid, "missing separator"))?;
    if tag.is_empty() {
        return Err(Error::parse(cid, "empty service type"));
    }
    if id.is_empty() {
        return Err(Error::parse(cid, "empty service-specific id"));
    }
    Ok((ServiceType::from_tag(tag), id.to_string()))
}

/// Encode a service type and id into the hex form of a content identifier.
pub fn encode_cid(service_type: &ServiceType, id: &str) -> String {
    format!(
        "{HEX_PREFIX}{}",
        hex::encode(format!("{}{SEPARATOR}{id}", service_type.tag()))
    )
}

fn decode_payload(cid: &str) -> crate::Result<Cow<'_, str>> {
    if cid.is_empty() {
        return Err(Error::parse(cid, "empty identifier"));
    }
    if cid.contains(SEPARATOR) {
        return Ok(Cow::Borrowed(cid));
    }
    let digits = cid.strip_prefix(HEX_PREFIX).unwrap_or(cid);
    let mut bytes = hex::decode(digits).map_err(|_| Error::parse(cid, "invalid hex payload"))?;
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    let text = String::from_utf8(bytes).map_err(|_| Error::parse(cid, "payload is not utf-8"))?;
    Ok(Cow::Owned(text))
}
