//! Channel tagging inside shared content text.
//!
//! Community chat messages are ordinary content records in the upstream
//! store; the channel they belong to rides along in the text body as
//! `"<message> |TAPESTRY_META|subnet=<name>[|imageUrl=<url>]"`. Keys after
//! the sentinel are `|`-separated `key=value` tokens, scanned
//! order-independently on extraction. As with the score codec, user text
//! containing the sentinel literal is not escaped.

/// Boundary between the message text and the encoded tag payload.
const META_DIVIDER: &str = "|TAPESTRY_META|";

const SUBNET_KEY: &str = "subnet=";
const IMAGE_URL_KEY: &str = "imageUrl=";

/// Which community a piece of content belongs to.
///
/// Created at content-creation time and immutable thereafter; it lives only
/// as a substring of the content record's text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTag {
    pub subnet_name: String,
    pub image_url: Option<String>,
}

/// Result of decomposing a tagged content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExtraction {
    pub clean_text: String,
    pub subnet_name: Option<String>,
    pub image_url: Option<String>,
}

/// Appends a subnet tag to a message body.
#[must_use]
pub fn pack(clean_text: &str, subnet_name: &str) -> String {
    format!("{clean_text} {META_DIVIDER}{SUBNET_KEY}{subnet_name}")
}

/// Appends a full tag, including the optional image URL key.
#[must_use]
pub fn pack_tag(clean_text: &str, tag: &ChannelTag) -> String {
    let mut packed = pack(clean_text, &tag.subnet_name);
    if let Some(url) = &tag.image_url {
        packed.push('|');
        packed.push_str(IMAGE_URL_KEY);
        packed.push_str(url);
    }
    packed
}

/// Splits a stored content string into its clean text and any tag keys.
///
/// Splits on the first sentinel occurrence; the pre-sentinel part is trimmed
/// into `clean_text`. Each known key's value runs to the next `|` or the end
/// of the string. A missing or empty-valued key yields `None` for that
/// field, never an error.
#[must_use]
pub fn extract(text: &str) -> TagExtraction {
    match text.split_once(META_DIVIDER) {
        None => TagExtraction {
            clean_text: text.to_owned(),
            subnet_name: None,
            image_url: None,
        },
        Some((body, payload)) => TagExtraction {
            clean_text: body.trim().to_owned(),
            subnet_name: scan_key(payload, SUBNET_KEY),
            image_url: scan_key(payload, IMAGE_URL_KEY),
        },
    }
}

/// Finds a `key=` token at the start of a `|`-separated segment and returns
/// its value. Empty values count as missing.
fn scan_key(payload: &str, key: &str) -> Option<String> {
    payload
        .split('|')
        .find_map(|segment| segment.strip_prefix(key))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
