//! model
//!
//! The CMIS domain model.
//!
//! # Modules
//!
//! - [`types`] - Ids, property values and the datetime rule
//! - [`options`] - Optional request parameters
//! - [`object`] - [`CmisObject`], allowable actions, [`SpecializedObject`]
//! - [`document`], [`folder`], [`relationship`] - Base-type variants
//! - [`object_type`] - Type and property definitions
//! - [`acl`] - Access control lists
//! - [`change`] - Change log entries, renditions, content streams
//!
//! # Example
//!
//! ```ignore
//! use cmisclient::model::{Options, SpecializedObject};
//!
//! match repo.get_object_by_path("/docs/readme.txt", &Options::new()).await? {
//!     SpecializedObject::Document(doc) => println!("{}", doc.get_content_stream().await?.text()),
//!     SpecializedObject::Folder(folder) => println!("folder {}", folder),
//!     other => println!("{}", other.object()),
//! }
//! ```

pub mod acl;
pub mod change;
pub mod document;
pub mod folder;
pub mod object;
pub mod object_type;
pub mod options;
pub mod relationship;
pub mod types;

pub use acl::{Ace, Acl};
pub use change::{ChangeEntry, ChangeType, ContentStream, Rendition};
pub use document::Document;
pub use folder::Folder;
pub use object::{AllowableActions, BaseType, CmisObject, Policy, SpecializedObject};
pub use object_type::{Cardinality, ObjectType, PropertyDefinition, TypeDefinition, Updatability};
pub use options::{Options, ReturnVersion};
pub use relationship::Relationship;
pub use types::{
    datetime_from_millis, format_datetime, parse_datetime, CmisId, Properties, PropertyType,
    PropertyValue,
};
