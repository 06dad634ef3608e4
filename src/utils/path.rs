//! Path utility functions

use std::path::PathBuf;

/// Per-application cache directory, falling back to the temp dir when the
/// platform has no cache location
pub fn get_cache_dir(app_name: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(app_name)
}

/// Join a base URL and a file name with exactly one slash between them
pub fn join_url(base: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cache_dir() {
        let dir = get_cache_dir("firmware-selector");
        assert!(dir.ends_with("firmware-selector"));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://asu.example/store/abc/", "image.bin"),
            "https://asu.example/store/abc/image.bin"
        );
        assert_eq!(join_url("https://x/targets/ath79", "/a.bin"), "https://x/targets/ath79/a.bin");
    }
}
