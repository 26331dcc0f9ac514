//! Filename sanitization for user-supplied uploads.

use unicode_normalization::UnicodeNormalization;

/// Normalize a declared filename to NFC and strip C0/C1 control characters.
/// The result is stored in job metadata and echoed back in error messages, so
/// it must be safe to log and render, and the same logical name must compare
/// equal regardless of how the client composed it (macOS sends NFD).
pub fn sanitize_file_name(name: &str) -> String {
    name.nfc().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize_file_name("photo\u{0}\u{1F}.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("clip\u{7F}\u{9F}.mp4"), "clip.mp4");
    }

    #[test]
    fn preserves_unicode_names() {
        assert_eq!(sanitize_file_name("Hochzeit_Grüße.png"), "Hochzeit_Grüße.png");
        assert_eq!(sanitize_file_name("結婚式.jpg"), "結婚式.jpg");
    }

    #[test]
    fn decomposed_names_are_normalized_to_nfc() {
        // "Grüße" with the umlaut as a combining diaeresis (U+0075 U+0308).
        let decomposed = "Gru\u{0308}ße.png";
        let composed = "Grüße.png";
        assert_ne!(decomposed, composed);
        assert_eq!(sanitize_file_name(decomposed), composed);
    }
}
