//! binding::atompub::write
//!
//! Request documents: entries, queries and ACLs.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::xml::XmlElement;
use super::{ATOM_NS, CMISRA_NS, CMIS_NS};
use crate::model::{Acl, CmisId, ContentStream, Properties, PropertyType};

fn atom(name: &str) -> XmlElement {
    XmlElement::new(ATOM_NS, None, name)
}

fn cmis(name: &str) -> XmlElement {
    XmlElement::new(CMIS_NS, Some("cmis"), name)
}

fn cmisra(name: &str) -> XmlElement {
    XmlElement::new(CMISRA_NS, Some("cmisra"), name)
}

/// An object entry carrying `properties` and optional inline content.
///
/// Null values are written as empty elements when `null_types` knows their
/// type and left out otherwise.
pub(crate) fn entry_xml(
    properties: &Properties,
    content: Option<&ContentStream>,
    null_types: &BTreeMap<String, PropertyType>,
) -> String {
    let mut entry = atom("entry");

    if let Some(name) = properties.get_str("cmis:name") {
        entry.push(atom("title").with_text(name));
    }

    if let Some(content) = content {
        entry.push(
            cmisra("content")
                .with_child(cmisra("mediatype").with_text(content.mime_type.clone()))
                .with_child(cmisra("base64").with_text(STANDARD.encode(&content.data))),
        );
    }

    let mut props = cmis("properties");
    for (id, value) in properties.iter() {
        let property_type = match value.property_type() {
            Some(t) => t,
            None => match null_types.get(id) {
                Some(t) => *t,
                None => continue,
            },
        };
        let mut element = cmis(property_type.element_name()).with_attr("propertyDefinitionId", id);
        for text in value.to_wire_strings() {
            element.push(cmis("value").with_text(text));
        }
        props.push(element);
    }
    entry.push(cmisra("object").with_child(props));
    entry.to_xml()
}

/// An entry that only names an object; used for move, addObject and
/// checked-out collection posts.
pub(crate) fn object_id_entry(object_id: &str) -> String {
    let props = Properties::new().with("cmis:objectId", CmisId::new(object_id));
    entry_xml(&props, None, &BTreeMap::new())
}

/// A bare entry, the body of a checkin.
pub(crate) fn empty_entry() -> String {
    atom("entry").to_xml()
}

/// A query document.
///
/// Each option becomes a CMIS element next to the statement.
pub(crate) fn query_xml(statement: &str, options: &[(&str, &str)]) -> String {
    let mut query = XmlElement::new(CMIS_NS, None, "query")
        .with_child(XmlElement::new(CMIS_NS, None, "statement").with_text(statement));
    for (name, value) in options {
        query.push(XmlElement::new(CMIS_NS, None, name).with_text(*value));
    }
    query.to_xml()
}

/// The direct entries of `acl`; an empty ACL still sends one empty
/// permission block.
pub(crate) fn acl_xml(acl: &Acl) -> String {
    let mut root = cmis("acl");
    let mut any = false;
    for ace in acl.direct_entries() {
        any = true;
        let mut block = cmis("permission")
            .with_child(cmis("principal").with_child(cmis("principalId").with_text(ace.principal_id.clone())));
        for permission in &ace.permissions {
            block.push(cmis("permission").with_text(permission.clone()));
        }
        block.push(cmis("direct").with_text("true"));
        root.push(block);
    }
    if !any {
        root.push(cmis("permission"));
    }
    root.to_xml()
}
