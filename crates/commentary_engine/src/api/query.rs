use percent_encoding::percent_decode_str;

/// Value of the first `key=value` pair with the given key in a query string.
///
/// Values are form-decoded: `+` is a space, `%XX` escapes are decoded and
/// invalid UTF-8 is replaced.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode(name) == key).then(|| decode(value))
    })
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("filter=todo", "filter"), Some("todo".to_string()));
        assert_eq!(
            query_param("a=1&filter=doc&filter=all", "filter"),
            Some("doc".to_string())
        );
        assert_eq!(query_param("a=1", "filter"), None);
        assert_eq!(query_param("filter", "filter"), Some(String::new()));
    }

    #[test]
    fn test_query_param_decoding() {
        assert_eq!(query_param("filter=%74odo", "filter"), Some("todo".to_string()));
        assert_eq!(query_param("q=a+b%20c", "q"), Some("a b c".to_string()));
        assert_eq!(query_param("%66ilter=doc", "filter"), Some("doc".to_string()));
    }
}
