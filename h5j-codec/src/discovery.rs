//! Encoder discovery.
//!
//! Asks the codec engine which encoders it offers for a codec family and
//! caches the answer. An empty answer disables encoding; decoding stays
//! available.

use std::sync::Mutex;

use crate::engine::CodecEngine;

/// Extracts the encoder names for `family` from an `ffmpeg -codecs` listing.
///
/// Lines look like
/// ` DEV.L. hevc  H.265 / HEVC (decoders: hevc hevc_qsv ) (encoders: libx265 hevc_nvenc )`.
/// Lines mentioning the family without an encoder list are skipped.
pub fn parse_encoder_listing(listing: &str, family: &str) -> Vec<String> {
    const MARKER: &str = "encoders:";

    let mut encoders = Vec::new();
    for line in listing.lines().filter(|line| line.contains(family)) {
        let Some(start) = line.find(MARKER) else {
            continue;
        };
        let rest = &line[start + MARKER.len()..];
        let list = rest.split(')').next().unwrap_or_default();
        encoders.extend(list.split_whitespace().map(str::to_string));
    }
    encoders
}

/// Lazily populated encoder list for one codec family.
pub struct EncoderCatalog {
    family: String,
    cached: Mutex<Option<Vec<String>>>,
}

impl EncoderCatalog {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the cached list, running discovery on first use. Engine
    /// failures yield an empty list.
    pub async fn get<E: CodecEngine>(&self, engine: &E) -> Vec<String> {
        let cached = self.lock().clone();
        if let Some(encoders) = cached {
            return encoders;
        }

        let encoders = match engine.list_encoders(&self.family).await {
            Ok(encoders) => encoders,
            Err(e) => {
                log::debug!("{} encoder discovery failed: {}", self.family, e);
                Vec::new()
            }
        };
        if encoders.is_empty() {
            log::warn!(
                "no {} encoder found - can only read h5j",
                self.family.to_uppercase()
            );
        } else {
            log::info!("{} encoders: {}", self.family, encoders.join(" "));
        }

        self.lock().get_or_insert(encoders).clone()
    }

    /// Forgets the cached list; the next query runs discovery again.
    pub fn reset(&self) {
        self.lock().take();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<String>>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Codecs:
 D..... = Decoding supported
 -------
 DEV.L. h264                 H.264 / AVC (encoders: libx264 h264_nvenc )
 DEV.L. hevc                 H.265 / HEVC (High Efficiency Video Coding) (decoders: hevc hevc_qsv ) (encoders: libx265 hevc_nvenc hevc_qsv )
 D.V.L. hevc_fake            decoder only line (decoders: hevc_fake )
";

    #[test]
    fn test_parse_hevc_encoders() {
        assert_eq!(
            parse_encoder_listing(LISTING, "hevc"),
            vec!["libx265", "hevc_nvenc", "hevc_qsv"]
        );
    }

    #[test]
    fn test_parse_unknown_family() {
        assert!(parse_encoder_listing(LISTING, "av1").is_empty());
        assert!(parse_encoder_listing("", "hevc").is_empty());
    }

    #[test]
    fn test_parse_empty_encoder_list() {
        let listing = " DEV.L. hevc   HEVC (encoders: )";
        assert!(parse_encoder_listing(listing, "hevc").is_empty());
    }
}
