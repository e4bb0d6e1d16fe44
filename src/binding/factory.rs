//! binding::factory
//!
//! Binding selection and creation.
//!
//! Callers use [`create_binding`] instead of naming a concrete binding, so
//! the repository and object model only ever see `dyn Binding`.
//!
//! # Detection
//!
//! When no binding is configured, [`detect_kind`] guesses from the service
//! URL path:
//! - `.../atom` or `.../atom11` → AtomPub
//! - `.../browser` or `.../json` → Browser
//!
//! # Example
//!
//! ```
//! use cmisclient::binding::BindingKind;
//!
//! assert_eq!(BindingKind::parse("AtomPub"), Some(BindingKind::AtomPub));
//! assert_eq!(BindingKind::Browser.name(), "browser");
//! ```

use std::sync::Arc;

use super::atompub::AtomPubBinding;
use super::browser::BrowserBinding;
use super::Binding;
use crate::error::{CmisError, Result};
use crate::transport::{Credentials, Transport};

/// Supported wire bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Atom/CMISRA XML
    AtomPub,
    /// JSON and form posts
    Browser,
}

impl BindingKind {
    pub fn all() -> &'static [BindingKind] {
        &[BindingKind::AtomPub, BindingKind::Browser]
    }

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            BindingKind::AtomPub => "atompub",
            BindingKind::Browser => "browser",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "atompub" | "atom" => Some(BindingKind::AtomPub),
            "browser" | "json" => Some(BindingKind::Browser),
            _ => None,
        }
    }
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Guess the binding from a service URL.
pub fn detect_kind(service_url: &str) -> Option<BindingKind> {
    let path = url::Url::parse(service_url).ok()?.path().to_lowercase();
    let last = path.trim_end_matches('/').rsplit('/').next()?.to_string();
    match last.as_str() {
        "atom" | "atom11" | "atompub" => Some(BindingKind::AtomPub),
        "browser" | "json" | "json11" => Some(BindingKind::Browser),
        _ => None,
    }
}

/// Create a binding for `service_url`.
///
/// `kind_override` wins over URL detection.
///
/// # Errors
///
/// `CmisError::InvalidArgument` when the override names no known binding,
/// or when nothing is given and the URL does not reveal one.
pub fn create_binding(
    service_url: &str,
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
    kind_override: Option<&str>,
) -> Result<Arc<dyn Binding>> {
    let kind = match kind_override {
        Some(name) => BindingKind::parse(name).ok_or_else(|| {
            CmisError::InvalidArgument(format!(
                "Unknown binding '{}'. Available bindings: {}",
                name,
                available_kinds_string()
            ))
        })?,
        None => detect_kind(service_url).ok_or_else(|| {
            CmisError::InvalidArgument(format!(
                "Could not detect the binding from service URL {}. \
                 Set one of: {}",
                service_url,
                available_kinds_string()
            ))
        })?,
    };
    Ok(create_binding_for_kind(kind, service_url, transport, credentials))
}

/// Create a binding of a known kind.
pub fn create_binding_for_kind(
    kind: BindingKind,
    service_url: &str,
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
) -> Arc<dyn Binding> {
    match kind {
        BindingKind::AtomPub => Arc::new(AtomPubBinding::new(service_url, transport, credentials)),
        BindingKind::Browser => Arc::new(BrowserBinding::new(service_url, transport, credentials)),
    }
}

fn available_kinds_string() -> String {
    BindingKind::all()
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    mod binding_kind {
        use super::*;

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(BindingKind::parse("ATOMPUB"), Some(BindingKind::AtomPub));
            assert_eq!(BindingKind::parse("Browser"), Some(BindingKind::Browser));
            assert_eq!(BindingKind::parse("soap"), None);
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", BindingKind::AtomPub), "atompub");
        }
    }

    mod detect_kind {
        use super::*;

        #[test]
        fn atom_paths() {
            assert_eq!(
                detect_kind("http://localhost:8080/chemistry/atom11/"),
                Some(BindingKind::AtomPub)
            );
            assert_eq!(
                detect_kind("http://localhost:8080/alfresco/cmisatom/atom"),
                Some(BindingKind::AtomPub)
            );
        }

        #[test]
        fn browser_paths() {
            assert_eq!(
                detect_kind("http://localhost:8080/nuxeo/json/cmis/json"),
                Some(BindingKind::Browser)
            );
            assert_eq!(
                detect_kind("https://h/inmemory/browser"),
                Some(BindingKind::Browser)
            );
        }

        #[test]
        fn undetectable() {
            assert_eq!(detect_kind("not a url"), None);
            assert_eq!(detect_kind("http://localhost:8080/nuxeo/atom/cmis"), None);
        }
    }

    mod create_binding {
        use super::*;

        #[test]
        fn override_wins() {
            let binding = create_binding(
                "http://h/whatever",
                Arc::new(MockTransport::new()),
                None,
                Some("browser"),
            )
            .unwrap();
            assert_eq!(binding.kind(), BindingKind::Browser);
        }

        #[test]
        fn unknown_override() {
            let err = create_binding("http://h/atom", Arc::new(MockTransport::new()), None, Some("soap"))
                .unwrap_err();
            assert!(matches!(err, CmisError::InvalidArgument(msg) if msg.contains("soap")));
        }

        #[test]
        fn undetectable_url() {
            let err = create_binding("http://h/cmis", Arc::new(MockTransport::new()), None, None)
                .unwrap_err();
            assert!(matches!(err, CmisError::InvalidArgument(_)));
        }
    }
}
