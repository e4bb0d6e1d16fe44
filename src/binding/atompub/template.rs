//! binding::atompub::template
//!
//! URI template filling.
//!
//! Servers advertise templates such as
//! `http://h/cmis/id?id={id}&filter={filter}&includeACL={includeACL}`.
//! Placeholders are filled from, in increasing precedence: the defaults
//! below, the call's own values (`id`, `path`) and the caller's options.
//! Options the template has no placeholder for are appended as query
//! parameters so that servers with partial templates still receive them.
//! Placeholders left without a value are emptied.

use crate::model::Options;

const DEFAULTS: &[(&str, &str)] = &[
    ("filter", ""),
    ("includeAllowableActions", "false"),
    ("includePolicyIds", "false"),
    ("includeRelationships", ""),
    ("includeACL", "false"),
    ("renditionFilter", ""),
];

/// Fill `template` and append leftover options.
///
/// `values` are the call's own placeholders; a value whose key is `path`
/// keeps its slashes.
pub(crate) fn fill(template: &str, values: &[(&str, &str)], options: &Options) -> String {
    let mut params: Vec<(String, String)> = DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in values {
        set(&mut params, k, v);
    }

    let mut extra = Options::new();
    for (k, v) in options.iter() {
        if template.contains(&placeholder(k)) {
            set(&mut params, k, v);
        } else {
            extra.set(k, v);
        }
    }

    let mut url = template.to_string();
    for (k, v) in &params {
        let encoded = if k == "path" {
            encode_path(v)
        } else {
            encode(v)
        };
        url = url.replace(&placeholder(k), &encoded);
    }
    extra.append_to(&clear_placeholders(&url))
}

fn set(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

fn encode(value: &str) -> String {
    // form encoding turns spaces into '+'; literal '+' is already %2B
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn encode_path(path: &str) -> String {
    path.split('/').map(encode).collect::<Vec<_>>().join("/")
}

fn clear_placeholders(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find('{') {
        match rest[start..].find('}') {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Remove every `name=` parameter from the query of `url`.
pub(crate) fn strip_query_param(url: &str, name: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(name))
        .collect();
    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BY_ID: &str = "http://h/cmis/id?id={id}&filter={filter}&includeAllowableActions={includeAllowableActions}";

    mod fill {
        use super::*;

        #[test]
        fn defaults_and_values() {
            let url = fill(BY_ID, &[("id", "a b")], &Options::new());
            assert_eq!(
                url,
                "http://h/cmis/id?id=a%20b&filter=&includeAllowableActions=false"
            );
        }

        #[test]
        fn options_override_defaults() {
            let opts = Options::new().include_allowable_actions(true).filter("cmis:name");
            let url = fill(BY_ID, &[("id", "1")], &opts);
            assert_eq!(
                url,
                "http://h/cmis/id?id=1&filter=cmis%3Aname&includeAllowableActions=true"
            );
        }

        #[test]
        fn untemplated_options_are_appended() {
            let opts = Options::new().with("returnVersion", "latest");
            let url = fill("http://h/cmis/id?id={id}", &[("id", "1")], &opts);
            assert_eq!(url, "http://h/cmis/id?id=1&returnVersion=latest");
        }

        #[test]
        fn path_keeps_slashes() {
            let url = fill("http://h/cmis/p?path={path}", &[("path", "/My Docs/a+b.txt")], &Options::new());
            assert_eq!(url, "http://h/cmis/p?path=/My%20Docs/a%2Bb.txt");
        }

        #[test]
        fn unknown_placeholders_are_emptied() {
            let url = fill("http://h/t/{id}?x={unknown}", &[("id", "cmis:folder")], &Options::new());
            assert_eq!(url, "http://h/t/cmis%3Afolder?x=");
        }
    }

    #[test]
    fn strip_depth() {
        assert_eq!(
            strip_query_param("http://h/d?id=1&depth=3&x=y", "depth"),
            "http://h/d?id=1&x=y"
        );
        assert_eq!(strip_query_param("http://h/d?depth=3", "depth"), "http://h/d");
        assert_eq!(strip_query_param("http://h/d", "depth"), "http://h/d");
    }
}
