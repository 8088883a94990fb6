//! Multi-valued form data.
//!
//! [`QueryDict`] wraps [`MultiValueDict`] to hold submitted form values, where
//! one key may carry several values (a multi-choice selection) and the last
//! value wins for single-valued reads.

use queryform_core::utils::MultiValueDict;

/// A dictionary of submitted form data.
///
/// # Examples
///
/// ```
/// use queryform_forms::QueryDict;
///
/// let qd = QueryDict::parse("integer_0=12&integer_1=19&boolean=true&boolean=false");
/// assert_eq!(qd.get("integer_0"), Some("12"));
/// assert_eq!(qd.get_list("boolean"), ["true", "false"]);
/// assert!(qd.get_list("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string (e.g. `"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and keeps repeated keys.
    pub fn parse(query_string: &str) -> Self {
        let mut data = MultiValueDict::new();
        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));
            data.append(percent_decode(key), percent_decode(value));
        }
        Self { data }
    }

    /// Builds a `QueryDict` from already-decoded pairs, keeping repeats.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(&key.to_string()).map(String::as_str)
    }

    /// Returns every value for `key`, or an empty slice.
    pub fn get_list(&self, key: &str) -> &[String] {
        self.data.get_list(&key.to_string())
    }

    /// Replaces the values for `key` with a single value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.data.set(key.to_string(), value.to_string());
    }

    /// Appends a value to the list for `key`.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data.append(key.to_string(), value.to_string());
    }

    /// Encodes the data as a URL query string with sorted pairs.
    pub fn urlencode(&self) -> String {
        let mut parts = Vec::new();
        for (key, values) in self.data.iter() {
            for value in values {
                parts.push(format!("{}={}", percent_encode(key), percent_encode(value)));
            }
        }
        parts.sort();
        parts.join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}

fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("choice=1&choice=3&choice=2");
        assert_eq!(qd.get("choice"), Some("2"));
        assert_eq!(qd.get_list("choice"), ["1", "3", "2"]);
        assert_eq!(qd.len(), 1);
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("name=hello+world&path=%2Fa%2Fb&flag");
        assert_eq!(qd.get("name"), Some("hello world"));
        assert_eq!(qd.get("path"), Some("/a/b"));
        assert_eq!(qd.get("flag"), Some(""));
    }

    #[test]
    fn test_parse_skips_empty_pairs() {
        let qd = QueryDict::parse("a=1&&b=2&");
        assert_eq!(qd.len(), 2);
        assert!(QueryDict::parse("").is_empty());
    }

    #[test]
    fn test_from_pairs_keeps_order() {
        let qd = QueryDict::from_pairs([("b", "2"), ("a", "1"), ("b", "3")]);
        let keys: Vec<&String> = qd.keys().collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(qd.get_list("b"), ["2", "3"]);
    }

    #[test]
    fn test_set_and_append() {
        let mut qd = QueryDict::new();
        qd.append("x", "1");
        qd.append("x", "2");
        assert_eq!(qd.get_list("x").len(), 2);
        qd.set("x", "9");
        assert_eq!(qd.get_list("x"), ["9"]);
        assert!(qd.contains_key("x"));
    }

    #[test]
    fn test_urlencode_sorted_and_escaped() {
        let qd = QueryDict::from_pairs([("z", "a b"), ("a", "1/2")]);
        assert_eq!(qd.urlencode(), "a=1%2F2&z=a%20b");
    }
}
