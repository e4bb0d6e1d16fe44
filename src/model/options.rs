//! model::options
//!
//! CMIS optional request parameters.
//!
//! CMIS services accept an open-ended set of optional parameters
//! (`filter`, `maxItems`, `includeAllowableActions`, ...). [`Options`] keeps
//! them as name/value strings with typed setters for the common ones. Each
//! binding decides how to send them: AtomPub as query parameters or URI
//! template values, Browser as query parameters on reads and form fields on
//! writes.

use std::collections::BTreeMap;

/// Version selector for `returnVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnVersion {
    This,
    Latest,
    LatestMajor,
}

impl ReturnVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnVersion::This => "this",
            ReturnVersion::Latest => "latest",
            ReturnVersion::LatestMajor => "latestmajor",
        }
    }
}

/// Optional CMIS parameters, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A copy of `self` overlaid with `other`; `other` wins on conflicts.
    pub fn merged(&self, other: &Options) -> Options {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            merged.set(k, v);
        }
        merged
    }

    pub fn filter(self, filter: &str) -> Self {
        self.with("filter", filter)
    }

    pub fn max_items(self, n: u32) -> Self {
        self.with("maxItems", n)
    }

    pub fn skip_count(self, n: u32) -> Self {
        self.with("skipCount", n)
    }

    pub fn order_by(self, order: &str) -> Self {
        self.with("orderBy", order)
    }

    pub fn include_allowable_actions(self, include: bool) -> Self {
        self.with("includeAllowableActions", include)
    }

    pub fn include_acl(self, include: bool) -> Self {
        self.with("includeACL", include)
    }

    pub fn include_relationships(self, which: &str) -> Self {
        self.with("includeRelationships", which)
    }

    pub fn rendition_filter(self, filter: &str) -> Self {
        self.with("renditionFilter", filter)
    }

    pub fn depth(self, depth: i32) -> Self {
        self.with("depth", depth)
    }

    pub fn all_versions(self, all: bool) -> Self {
        self.with("allVersions", all)
    }

    pub fn search_all_versions(self, all: bool) -> Self {
        self.with("searchAllVersions", all)
    }

    pub fn return_version(self, version: ReturnVersion) -> Self {
        self.with("returnVersion", version.as_str())
    }

    /// URL-encoded `name=value&...` string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.iter() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }

    /// Append these options to `url` as query parameters.
    pub fn append_to(&self, url: &str) -> String {
        if self.is_empty() {
            return url.to_string();
        }
        let sep = if url.contains('?') {
            if url.ends_with('?') || url.ends_with('&') {
                ""
            } else {
                "&"
            }
        } else {
            "?"
        };
        format!("{}{}{}", url, sep, self.to_query_string())
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (k, v) in iter {
            options.set(k, v);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_setters() {
        let opts = Options::new()
            .max_items(5)
            .include_allowable_actions(true)
            .depth(-1)
            .return_version(ReturnVersion::LatestMajor);

        assert_eq!(opts.get("maxItems"), Some("5"));
        assert_eq!(opts.get("includeAllowableActions"), Some("true"));
        assert_eq!(opts.get("depth"), Some("-1"));
        assert_eq!(opts.get("returnVersion"), Some("latestmajor"));
    }

    #[test]
    fn merged_prefers_other() {
        let base = Options::new().filter("*").max_items(10);
        let over = Options::new().max_items(2);
        let merged = base.merged(&over);
        assert_eq!(merged.get("filter"), Some("*"));
        assert_eq!(merged.get("maxItems"), Some("2"));
    }

    mod append_to {
        use super::*;

        #[test]
        fn empty_options_leave_url_alone() {
            assert_eq!(Options::new().append_to("http://h/x?a=1"), "http://h/x?a=1");
        }

        #[test]
        fn picks_separator() {
            let opts = Options::new().max_items(1);
            assert_eq!(opts.append_to("http://h/x"), "http://h/x?maxItems=1");
            assert_eq!(opts.append_to("http://h/x?a=1"), "http://h/x?a=1&maxItems=1");
            assert_eq!(opts.append_to("http://h/x?"), "http://h/x?maxItems=1");
        }

        #[test]
        fn encodes_values() {
            let opts = Options::new().filter("cmis:name,cmis:objectId");
            assert_eq!(opts.append_to("http://h/"), "http://h/?filter=cmis%3Aname%2Ccmis%3AobjectId");
        }
    }
}
