//! Request headers derived from environment variables
//!
//! A variable named `<prefix>X_API_KEY` becomes the header `X-API-KEY`: the
//! prefix is stripped and underscores turn into hyphens. Matching is
//! case-sensitive on the prefix.

use std::collections::BTreeMap;

/// Build headers from an environment snapshot.
///
/// Pure: the caller supplies the `(name, value)` pairs, which keeps this
/// testable without touching the process environment. An empty prefix
/// yields no headers, as do variables whose name is exactly the prefix.
///
/// # Example
///
/// ```rust
/// use courier_common::utils::env::load_headers;
///
/// let env = vec![
///     ("HTTP_HEADER_X_TENANT".to_string(), "acme".to_string()),
///     ("PATH".to_string(), "/usr/bin".to_string()),
/// ];
/// let headers = load_headers("HTTP_HEADER_", env);
/// assert_eq!(headers.get("X-TENANT").map(String::as_str), Some("acme"));
/// assert_eq!(headers.len(), 1);
/// ```
pub fn load_headers<I>(prefix: &str, snapshot: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    if prefix.is_empty() {
        return BTreeMap::new();
    }

    snapshot
        .into_iter()
        .filter_map(|(name, value)| {
            let header = name.strip_prefix(prefix)?;
            if header.is_empty() {
                return None;
            }
            Some((header.replace('_', "-"), value))
        })
        .collect()
}

/// [`load_headers`] over the current process environment.
///
/// Variables that are not valid Unicode are skipped.
pub fn load_headers_from_env(prefix: &str) -> BTreeMap<String, String> {
    let vars = std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)));
    load_headers(prefix, vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn strips_prefix_and_maps_underscores() {
        let headers = load_headers(
            "HTTP_HEADER_",
            snapshot(&[
                ("HTTP_HEADER_X_API_KEY", "k1"),
                ("HTTP_HEADER_Tenant", "acme"),
                ("OTHER_X", "ignored"),
            ]),
        );

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-API-KEY"], "k1");
        assert_eq!(headers["Tenant"], "acme");
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let headers = load_headers("HTTP_HEADER_", snapshot(&[("http_header_x", "v")]));
        assert!(headers.is_empty());
    }

    #[test]
    fn skips_bare_prefix_and_empty_prefix() {
        let env = snapshot(&[("HTTP_HEADER_", "v"), ("PATH", "/bin")]);
        assert!(load_headers("HTTP_HEADER_", env.clone()).is_empty());
        assert!(load_headers("", env).is_empty());
    }

    #[test]
    fn later_duplicates_win() {
        let headers = load_headers(
            "H_",
            snapshot(&[("H_X_A", "first"), ("H_X-A", "second")]),
        );
        assert_eq!(headers["X-A"], "second");
    }
}
