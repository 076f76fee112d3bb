// src/media.rs
use reqwest::Url;

/// Maps a stored image path to the URL the storefront should load.
///
/// Absolute http(s) URLs (CDN uploads) are returned verbatim; anything else is
/// treated as a path under the local storage mount.
pub fn resolve_display_url(path: Option<&str>, storage_base: &str) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;

    if let Ok(url) = Url::parse(path) {
        if matches!(url.scheme(), "http" | "https") {
            return Some(path.to_string());
        }
    }

    Some(format!(
        "{}/{}",
        storage_base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000/storage";

    #[test]
    fn absolute_urls_pass_through() {
        let cdn = "https://res.cloudinary.com/demo/image/upload/v1/games/ml.png";
        assert_eq!(resolve_display_url(Some(cdn), BASE).as_deref(), Some(cdn));
        assert_eq!(
            resolve_display_url(Some("http://cdn.example.com/a.png"), BASE).as_deref(),
            Some("http://cdn.example.com/a.png")
        );
    }

    #[test]
    fn relative_paths_use_storage_mount() {
        assert_eq!(
            resolve_display_url(Some("games/thumb.png"), BASE).as_deref(),
            Some("http://localhost:3000/storage/games/thumb.png")
        );
        assert_eq!(
            resolve_display_url(Some("/icons/x.webp"), "/storage/").as_deref(),
            Some("/storage/icons/x.webp")
        );
    }

    #[test]
    fn empty_paths_have_no_url() {
        assert_eq!(resolve_display_url(None, BASE), None);
        assert_eq!(resolve_display_url(Some("   "), BASE), None);
    }

    #[test]
    fn non_http_schemes_are_treated_as_paths() {
        assert_eq!(
            resolve_display_url(Some("c:icons/a.png"), BASE).as_deref(),
            Some("http://localhost:3000/storage/c:icons/a.png")
        );
    }
}
