//! cmisclient - An async client for OASIS CMIS repositories
//!
//! Talks to content repositories over either CMIS 1.0 wire binding,
//! AtomPub (XML) or Browser (JSON), and presents one object model on top:
//! repositories, documents, folders, relationships, policies, type
//! definitions, ACLs, versioning and paged result sets.
//!
//! # Architecture
//!
//! The codebase is layered; each layer only talks to the one below:
//!
//! - [`client`] - Service discovery, hands out repositories
//! - [`repository`] - Repository metadata, capability gating, object lookup
//! - [`model`] - Object model: specialization, versioning, ACLs, types
//! - [`result_set`] - Hypermedia-driven paging over listings
//! - [`binding`] - Wire protocols behind the `Binding` trait
//! - [`transport`] - HTTP behind the `Transport` trait
//! - [`error`] - Error taxonomy and HTTP status mapping
//! - [`config`] - Connection settings for applications and the `cmis` binary
//! - [`cli`] - The `cmis` command-line inspector
//!
//! # Invariants
//!
//! 1. Only the binding layer turns HTTP statuses into errors
//! 2. Capability and allowable-action checks fail before any request is sent
//! 3. An object never mixes state from two server responses
//! 4. No operation is retried automatically
//!
//! # Example
//!
//! ```ignore
//! use cmisclient::{CmisClient, Options};
//!
//! let client = CmisClient::new("http://localhost:8080/cmis/atom", "admin", "admin")?;
//! let repo = client.get_default_repository().await?;
//! let results = repo
//!     .query("SELECT * FROM cmis:document", &Options::new().max_items(10))
//!     .await?;
//! for doc in results {
//!     println!("{:?}", doc.object().name());
//! }
//! ```

pub mod binding;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod repository;
pub mod result_set;
pub mod transport;

pub use client::{CmisClient, RepositorySummary};
pub use config::ClientConfig;
pub use error::{CmisError, Result};
pub use model::{
    Ace, Acl, CmisId, CmisObject, ContentStream, Document, Folder, Options, Policy, Properties,
    PropertyValue, Relationship, SpecializedObject,
};
pub use repository::Repository;
pub use result_set::{ChangeResultSet, ObjectResultSet, ResultSet};
