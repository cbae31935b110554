//! Avatar image handling: base64 data-URI decoding feeding the blob
//! store port. A standalone helper with explicit inputs — no shared
//! handler state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use saidso_core::SaidsoResult;
use saidso_core::ports::BlobStore;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A decoded inline image.
#[derive(Debug)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decode a `data:image/<ext>;base64,<payload>` URI.
///
/// Returns `None` when the input is not a data URI, names a
/// disallowed image type, or carries an undecodable payload.
pub fn decode_image_data_uri(input: &str) -> Option<DecodedImage> {
    let rest = input.strip_prefix("data:image/")?;
    let (extension, payload) = rest.split_once(";base64,")?;

    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    let bytes = STANDARD.decode(payload).ok()?;
    Some(DecodedImage { extension, bytes })
}

/// Resolve an avatar input to a stored reference.
///
/// - data URIs are decoded and written to the blob store, yielding an
///   opaque reference;
/// - any other non-empty string is treated as an existing path or URL
///   and passed through unchanged;
/// - undecodable data URIs yield `Ok(None)` (leave the avatar as is).
pub async fn store_avatar<B: BlobStore>(
    store: &B,
    folder: &str,
    input: &str,
) -> SaidsoResult<Option<String>> {
    if input.is_empty() {
        return Ok(None);
    }
    if !input.starts_with("data:image/") {
        return Ok(Some(input.to_string()));
    }

    match decode_image_data_uri(input) {
        Some(image) => {
            let reference = store.put(folder, &image.extension, image.bytes).await?;
            Ok(Some(reference))
        }
        None => Ok(None),
    }
}
