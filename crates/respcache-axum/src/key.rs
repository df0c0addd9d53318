//! Cache key derivation from request identity.

use axum::http::Uri;

/// Fixed prefix distinguishing this layer's entries from unrelated data in
/// a shared store.
pub const KEY_NAMESPACE: &str = "respcache";

/// Derive the cache key for a request.
///
/// The key is the full request path plus query string under the
/// [`KEY_NAMESPACE`] prefix. Two requests with an identical path and query
/// always map to the same key; the method is deliberately not part of the
/// identity.
pub fn cache_key(uri: &Uri) -> String {
    let identity = uri
        .path_and_query()
        .map_or(uri.path(), |path_and_query| path_and_query.as_str());
    format!("{KEY_NAMESPACE}:{identity}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_path_and_query() {
        let uri: Uri = "/api/applications?status=open&page=2".parse().unwrap();
        assert_eq!(
            cache_key(&uri),
            "respcache:/api/applications?status=open&page=2"
        );
    }

    #[test]
    fn identical_requests_derive_identical_keys() {
        let a: Uri = "/users/42?fields=name".parse().unwrap();
        let b: Uri = "/users/42?fields=name".parse().unwrap();
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn query_string_is_part_of_the_identity() {
        let bare: Uri = "/users/42".parse().unwrap();
        let filtered: Uri = "/users/42?fields=name".parse().unwrap();
        assert_ne!(cache_key(&bare), cache_key(&filtered));
        assert_eq!(cache_key(&bare), "respcache:/users/42");
    }
}
