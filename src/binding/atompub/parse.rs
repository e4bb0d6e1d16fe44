//! binding::atompub::parse
//!
//! Decoding of service documents, entries and feeds.

use std::collections::BTreeMap;

use tracing::debug;

use super::xml::{XmlElement, XmlNode};
use super::{ATOM_NS, APP_NS, CMISRA_NS, CMIS_NS};
use crate::binding::{ObjectData, Page, PageNav, RawEntry, RawRepository, RepositoryData};
use crate::error::{CmisError, Result};
use crate::model::{
    parse_datetime, Acl, AllowableActions, BaseType, Cardinality, ChangeEntry, ChangeType,
    Properties, PropertyDefinition, PropertyType, PropertyValue, Rendition, TypeDefinition,
    Updatability,
};
use crate::repository::{
    AclCapability, Capabilities, CapabilityValue, RepositoryInfo, UriTemplate,
};

/// An `atom:link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AtomLink {
    pub rel: String,
    pub href: String,
    pub media_type: Option<String>,
}

/// What a workspace offers beyond repository info.
#[derive(Debug, Clone, Default)]
pub(crate) struct AtomWorkspace {
    /// `cmisra:collectionType` to href.
    pub collections: BTreeMap<String, String>,
    pub links: Vec<AtomLink>,
}

impl AtomWorkspace {
    pub fn collection(&self, kind: &str) -> Option<&str> {
        self.collections.get(kind).map(String::as_str)
    }

    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == rel)
            .map(|l| l.href.as_str())
    }
}

/// Direct `atom:link` children of `element`.
pub(crate) fn links(element: &XmlElement) -> Vec<AtomLink> {
    element
        .children_named(ATOM_NS, "link")
        .filter_map(|l| {
            Some(AtomLink {
                rel: l.attr("rel")?.to_string(),
                href: l.attr("href")?.to_string(),
                media_type: l.attr("type").map(str::to_string),
            })
        })
        .collect()
}

/// Href of the first link with `rel` whose type satisfies `accept`.
pub(crate) fn find_link(
    element: &XmlElement,
    rel: &str,
    accept: impl Fn(Option<&str>) -> bool,
) -> Option<String> {
    links(element)
        .into_iter()
        .find(|l| l.rel == rel && accept(l.media_type.as_deref()))
        .map(|l| l.href)
}

pub(crate) fn link(element: &XmlElement, rel: &str) -> Option<String> {
    find_link(element, rel, |_| true)
}

fn text_of(element: &XmlElement) -> Option<String> {
    let text = element.text().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn bool_of(element: &XmlElement, name: &str) -> bool {
    element.child_text(CMIS_NS, name).as_deref() == Some("true")
}

// Service document.

/// Decode every workspace of a service document.
pub(crate) fn parse_service(root: &XmlElement) -> Result<Vec<RepositoryData>> {
    if !root.is(APP_NS, "service") {
        return Err(CmisError::protocol(format!(
            "expected an app:service document, got '{}'",
            root.name
        )));
    }
    root.descendants(APP_NS, "workspace")
        .into_iter()
        .map(parse_workspace)
        .collect()
}

fn parse_workspace(workspace: &XmlElement) -> Result<RepositoryData> {
    let info_el = workspace
        .child(CMISRA_NS, "repositoryInfo")
        .ok_or_else(|| CmisError::protocol("workspace has no cmisra:repositoryInfo"))?;

    let mut info = RepositoryInfo::new();
    let mut capabilities = Capabilities::new();
    let mut acl_capability = None;
    for child in info_el.elements() {
        match child.name.as_str() {
            "capabilities" => {
                for cap in child.elements() {
                    capabilities.insert(&cap.name, CapabilityValue::parse(&cap.text()));
                }
            }
            "aclCapability" => acl_capability = Some(parse_acl_capability(child)),
            name => info.insert(name, text_of(child)),
        }
    }

    let mut collections = BTreeMap::new();
    for collection in workspace.children_named(APP_NS, "collection") {
        let (Some(href), Some(kind)) = (
            collection.attr("href"),
            collection.child_text(CMISRA_NS, "collectionType"),
        ) else {
            continue;
        };
        collections.insert(kind, href.to_string());
    }

    let mut uri_templates = BTreeMap::new();
    for element in workspace.descendants(CMISRA_NS, "uritemplate") {
        let (Some(template), Some(template_type)) = (
            element.child_text(CMISRA_NS, "template"),
            element.child_text(CMISRA_NS, "type"),
        ) else {
            continue;
        };
        uri_templates.insert(
            template_type.clone(),
            UriTemplate {
                template,
                template_type,
                media_type: element.child_text(CMISRA_NS, "mediatype"),
            },
        );
    }

    debug!(repository = info.id(), collections = collections.len(), "parsed workspace");
    Ok(RepositoryData {
        info,
        capabilities,
        acl_capability,
        uri_templates,
        raw: RawRepository::Atom(AtomWorkspace {
            collections,
            links: links(workspace),
        }),
    })
}

fn parse_acl_capability(element: &XmlElement) -> AclCapability {
    let mut capability = AclCapability {
        supported_permissions: element.child_text(CMIS_NS, "supportedPermissions"),
        propagation: element.child_text(CMIS_NS, "propagation"),
        ..Default::default()
    };
    for permissions in element.children_named(CMIS_NS, "permissions") {
        if let Some(permission) = permissions.child_text(CMIS_NS, "permission") {
            let description = permissions
                .child_text(CMIS_NS, "description")
                .unwrap_or_default();
            capability.permissions.insert(permission, description);
        }
    }
    for mapping in element.children_named(CMIS_NS, "mapping") {
        if let Some(key) = mapping.child_text(CMIS_NS, "key") {
            let permissions = mapping
                .children_named(CMIS_NS, "permission")
                .map(|p| p.text().trim().to_string())
                .collect();
            capability.mapping.insert(key, permissions);
        }
    }
    capability
}

// Entries and feeds.

/// The only entry of a response that must carry exactly one.
pub(crate) fn single_entry(root: &XmlElement) -> Result<&XmlElement> {
    if root.is(ATOM_NS, "entry") {
        return Ok(root);
    }
    let entries = root.descendants(ATOM_NS, "entry");
    match entries.as_slice() {
        [entry] => Ok(*entry),
        _ => Err(CmisError::protocol(format!(
            "expected exactly one atom:entry, found {}",
            entries.len()
        ))),
    }
}

/// Decode an object entry.
pub(crate) fn parse_entry(entry: &XmlElement) -> Result<ObjectData> {
    let object = entry.child(CMISRA_NS, "object");
    let properties = match object.and_then(|o| o.child(CMIS_NS, "properties")) {
        Some(props) => parse_properties(props)?,
        None => Properties::new(),
    };

    let mut data = ObjectData::new(properties, RawEntry::Atom(without_children(entry)));
    data.title = entry.child_text(ATOM_NS, "title");
    data.relative_path_segment = entry.child_text(CMISRA_NS, "relativePathSegment");
    if let Some(object) = object {
        data.allowable_actions = object
            .child(CMIS_NS, "allowableActions")
            .map(parse_allowable_actions);
        data.acl = object.child(CMIS_NS, "acl").map(parse_acl);
    }
    Ok(data)
}

/// A copy of an entry without its nested `cmisra:children` feed.
fn without_children(entry: &XmlElement) -> XmlElement {
    let mut copy = entry.clone();
    copy.children.retain(|node| match node {
        XmlNode::Element(e) => !e.is(CMISRA_NS, "children"),
        XmlNode::Text(_) => true,
    });
    copy
}

/// Decode `cmis:properties`.
pub(crate) fn parse_properties(element: &XmlElement) -> Result<Properties> {
    let mut properties = Properties::new();
    for prop in element.elements() {
        let Some(property_type) = PropertyType::from_element_name(&prop.name) else {
            debug!(element = %prop.name, "skipping unknown property element");
            continue;
        };
        let Some(id) = prop.attr("propertyDefinitionId") else {
            continue;
        };
        let mut values = prop
            .children_named(CMIS_NS, "value")
            .map(|v| property_type.decode(&v.text()))
            .collect::<Result<Vec<_>>>()?;
        let value = match values.len() {
            0 => PropertyValue::Null,
            1 => values.remove(0),
            _ => PropertyValue::Multi(values),
        };
        properties.insert(id, value);
    }
    Ok(properties)
}

pub(crate) fn parse_allowable_actions(element: &XmlElement) -> AllowableActions {
    element
        .elements()
        .map(|a| (a.name.clone(), a.text().trim() == "true"))
        .collect()
}

/// Decode `cmis:acl`. Permission blocks without permissions are skipped.
pub(crate) fn parse_acl(element: &XmlElement) -> Acl {
    let mut acl = Acl::new();
    for block in element.children_named(CMIS_NS, "permission") {
        let Some(principal) = block
            .child(CMIS_NS, "principal")
            .and_then(|p| p.child_text(CMIS_NS, "principalId"))
        else {
            continue;
        };
        let permissions: Vec<String> = block
            .children_named(CMIS_NS, "permission")
            .filter_map(text_of)
            .collect();
        if permissions.is_empty() {
            continue;
        }
        let direct = block.child_text(CMIS_NS, "direct").as_deref() == Some("true");
        acl.add_entry(principal, permissions, direct);
    }
    acl
}

/// Paging cursor from a feed's links.
pub(crate) fn parse_nav(feed: &XmlElement) -> PageNav {
    let mut nav = PageNav {
        linked: true,
        ..PageNav::default()
    };
    for l in links(feed) {
        let rel = match l.rel.as_str() {
            "previous" => "prev",
            rel @ ("first" | "prev" | "next" | "last" | "self") => rel,
            _ => continue,
        };
        nav.links.entry(rel.to_string()).or_insert(l.href);
    }
    nav.num_items = feed
        .child_text(CMISRA_NS, "numItems")
        .and_then(|n| n.parse().ok());
    nav
}

/// All entries of a feed in document order; nested trees come out
/// parents first.
pub(crate) fn parse_feed(root: &XmlElement) -> Result<Page<ObjectData>> {
    if root.is(ATOM_NS, "entry") {
        return Ok(Page::new(vec![parse_entry(root)?], PageNav::default()));
    }
    let items = root
        .descendants(ATOM_NS, "entry")
        .into_iter()
        .map(parse_entry)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, parse_nav(root)))
}

// Types.

pub(crate) fn parse_type(entry: &XmlElement) -> Result<TypeDefinition> {
    let type_el = if entry.is(CMISRA_NS, "type") {
        entry
    } else {
        entry
            .child(CMISRA_NS, "type")
            .ok_or_else(|| CmisError::protocol("type entry has no cmisra:type"))?
    };
    let id = type_el
        .child_text(CMIS_NS, "id")
        .ok_or_else(|| CmisError::protocol("type definition has no cmis:id"))?;

    let property_definitions: BTreeMap<String, PropertyDefinition> = type_el
        .elements()
        .filter(|e| e.name.starts_with("property") && e.name.ends_with("Definition"))
        .filter_map(parse_property_definition)
        .map(|d| (d.id.clone(), d))
        .collect();

    Ok(TypeDefinition {
        id,
        local_name: type_el.child_text(CMIS_NS, "localName"),
        local_namespace: type_el.child_text(CMIS_NS, "localNamespace"),
        display_name: type_el.child_text(CMIS_NS, "displayName"),
        query_name: type_el.child_text(CMIS_NS, "queryName"),
        description: type_el.child_text(CMIS_NS, "description"),
        base_id: type_el
            .child_text(CMIS_NS, "baseId")
            .and_then(|b| BaseType::parse(&b)),
        parent_id: type_el.child_text(CMIS_NS, "parentId"),
        creatable: bool_of(type_el, "creatable"),
        fileable: bool_of(type_el, "fileable"),
        queryable: bool_of(type_el, "queryable"),
        fulltext_indexed: bool_of(type_el, "fulltextIndexed"),
        included_in_supertype_query: bool_of(type_el, "includedInSupertypeQuery"),
        controllable_policy: bool_of(type_el, "controllablePolicy"),
        controllable_acl: bool_of(type_el, "controllableACL"),
        property_definitions: (!property_definitions.is_empty()).then_some(property_definitions),
    })
}

fn parse_property_definition(element: &XmlElement) -> Option<PropertyDefinition> {
    Some(PropertyDefinition {
        id: element.child_text(CMIS_NS, "id")?,
        local_name: element.child_text(CMIS_NS, "localName"),
        local_namespace: element.child_text(CMIS_NS, "localNamespace"),
        display_name: element.child_text(CMIS_NS, "displayName"),
        query_name: element.child_text(CMIS_NS, "queryName"),
        description: element.child_text(CMIS_NS, "description"),
        property_type: element
            .child_text(CMIS_NS, "propertyType")
            .and_then(|t| PropertyType::parse(&t)),
        cardinality: element
            .child_text(CMIS_NS, "cardinality")
            .and_then(|c| Cardinality::parse(&c)),
        updatability: element
            .child_text(CMIS_NS, "updatability")
            .and_then(|u| Updatability::parse(&u)),
        inherited: bool_of(element, "inherited"),
        required: bool_of(element, "required"),
        queryable: bool_of(element, "queryable"),
        orderable: bool_of(element, "orderable"),
        open_choice: bool_of(element, "openChoice"),
    })
}

/// Every type entry of a feed, flattened.
pub(crate) fn parse_type_feed(root: &XmlElement) -> Result<Vec<TypeDefinition>> {
    if root.is(ATOM_NS, "entry") {
        return Ok(vec![parse_type(root)?]);
    }
    root.descendants(ATOM_NS, "entry")
        .into_iter()
        .map(parse_type)
        .collect()
}

// Change log.

pub(crate) fn parse_change_entry(entry: &XmlElement) -> Result<ChangeEntry> {
    let object = entry.child(CMISRA_NS, "object");
    let properties = match object.and_then(|o| o.child(CMIS_NS, "properties")) {
        Some(props) => parse_properties(props)?,
        None => Properties::new(),
    };
    let info = object.and_then(|o| o.child(CMIS_NS, "changeEventInfo"));
    Ok(ChangeEntry {
        id: entry.child_text(ATOM_NS, "id").unwrap_or_default(),
        object_id: properties.get_id("cmis:objectId"),
        change_type: ChangeType::parse(
            &info
                .and_then(|i| i.child_text(CMIS_NS, "changeType"))
                .unwrap_or_default(),
        ),
        change_time: info
            .and_then(|i| i.child_text(CMIS_NS, "changeTime"))
            .and_then(|t| parse_datetime(&t)),
        acl: object.and_then(|o| o.child(CMIS_NS, "acl")).map(parse_acl),
        properties,
    })
}

pub(crate) fn parse_change_feed(root: &XmlElement) -> Result<Page<ChangeEntry>> {
    let items = root
        .descendants(ATOM_NS, "entry")
        .into_iter()
        .map(parse_change_entry)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, parse_nav(root)))
}

// Renditions.

pub(crate) fn parse_renditions(entry: &XmlElement) -> Vec<Rendition> {
    let number = |l: &XmlElement, name: &str| l.attr(name).and_then(|v| v.trim().parse().ok());
    let text = |l: &XmlElement, name: &str| l.attr(name).map(str::to_string);
    entry
        .children_named(ATOM_NS, "link")
        .filter(|l| l.attr("rel") == Some(super::RENDITION_REL))
        .map(|l| Rendition {
            stream_id: text(l, "streamId"),
            mime_type: text(l, "type"),
            length: number(l, "length"),
            title: text(l, "title"),
            kind: text(l, "renditionKind"),
            height: number(l, "height"),
            width: number(l, "width"),
            href: text(l, "href"),
            rendition_document_id: text(l, "renditionDocumentId"),
        })
        .collect()
}
