//! Filename helpers shared by key derivation and the optimizer.

/// Lowercased extension of a filename, without the dot. Falls back to "bin"
/// for names with no usable extension, so derived keys always carry one.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != file_name)
        .unwrap_or("bin")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Beach Day.JPG"), "jpg");
        assert_eq!(extension_of("clip.MP4"), "mp4");
    }

    #[test]
    fn names_without_extension_fall_back_to_bin() {
        assert_eq!(extension_of("clip"), "bin");
        assert_eq!(extension_of("trailing."), "bin");
    }

    #[test]
    fn only_the_last_segment_counts() {
        assert_eq!(extension_of("archive.tar.gz"), "gz");
    }
}
