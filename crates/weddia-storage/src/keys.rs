//! Shared key derivation for storage backends.
//!
//! Final keys look like `weddings/{wedding_id}/{timestamp}_{random}.{ext}`;
//! the staging copy of the same file lives at the key prefixed with `temp/`.
//! Uniqueness comes from the millisecond timestamp plus the random suffix,
//! never from the original filename, so same-named files in one batch cannot
//! collide.

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use weddia_core::filename::extension_of;

/// Prefix distinguishing the temporary staging namespace.
pub const TEMP_PREFIX: &str = "temp/";

const RANDOM_SUFFIX_LEN: usize = 13;

/// A final storage key together with its staging counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub storage_key: String,
    pub temp_key: String,
}

/// Derive the final and temporary keys for one uploaded file.
pub fn derive_keys(wedding_id: &str, file_name: &str) -> KeyPair {
    let extension = extension_of(file_name);
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    let storage_key = format!(
        "weddings/{}/{}_{}.{}",
        wedding_id,
        Utc::now().timestamp_millis(),
        suffix,
        extension
    );
    let temp_key = temp_key_for(&storage_key);
    KeyPair {
        storage_key,
        temp_key,
    }
}

/// The staging key corresponding to a final key.
pub fn temp_key_for(storage_key: &str) -> String {
    format!("{}{}", TEMP_PREFIX, storage_key)
}

/// Replace the extension portion of a key. Used when the optimizer changes
/// the output format (e.g. a JPEG re-encoded as WebP must land under `.webp`).
pub fn replace_extension(storage_key: &str, new_extension: &str) -> String {
    match storage_key.rfind('.') {
        Some(idx) => format!("{}.{}", &storage_key[..idx], new_extension),
        None => format!("{}.{}", storage_key, new_extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_keys_carry_wedding_scope_and_extension() {
        let keys = derive_keys("11111111-2222-3333-4444-555555555555", "Beach Day.JPG");
        assert!(keys
            .storage_key
            .starts_with("weddings/11111111-2222-3333-4444-555555555555/"));
        assert!(keys.storage_key.ends_with(".jpg"));
        assert_eq!(keys.temp_key, format!("temp/{}", keys.storage_key));
    }

    #[test]
    fn same_filename_never_collides() {
        let a = derive_keys("w", "photo.jpg");
        let b = derive_keys("w", "photo.jpg");
        assert_ne!(a.storage_key, b.storage_key);
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        let keys = derive_keys("w", "clip");
        assert!(keys.storage_key.ends_with(".bin"));
    }

    #[test]
    fn replace_extension_swaps_only_the_suffix() {
        assert_eq!(
            replace_extension("weddings/w/17_ab.jpg", "webp"),
            "weddings/w/17_ab.webp"
        );
        assert_eq!(replace_extension("weddings/w/17_ab", "webp"), "weddings/w/17_ab.webp");
    }
}
