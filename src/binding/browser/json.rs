//! binding::browser::json
//!
//! Decoding of Browser binding responses.
//!
//! Objects come in two shapes: `properties` (each value carries its `type`
//! and `cardinality`) and `succinctProperties` (bare values). Both decode
//! into [`Properties`] with the same cardinality rule as AtomPub: no value
//! is `Null`, one value is single-valued, more is `Multi`.
//!
//! Datetimes arrive as epoch milliseconds.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::binding::{ObjectData, Page, PageNav, RawEntry, RawRepository, RepositoryData};
use crate::error::{CmisError, Result};
use crate::model::{
    datetime_from_millis, Acl, Ace, AllowableActions, BaseType, Cardinality, ChangeEntry,
    ChangeType, Properties, PropertyDefinition, PropertyType, PropertyValue, Rendition,
    TypeDefinition, Updatability,
};
use crate::repository::{AclCapability, Capabilities, CapabilityValue, RepositoryInfo};

/// Keys of a repository entry that are not plain info fields.
const NON_INFO_KEYS: &[&str] = &["capabilities", "aclCapabilities", "repositoryUrl", "rootFolderUrl"];

pub(crate) fn parse_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| CmisError::protocol(format!("invalid JSON response: {}", e)))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CmisError::protocol(format!("expected a JSON object for {}", what)))
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| CmisError::protocol(format!("expected a JSON array for {}", what)))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Repositories.

/// The service document: one entry per repository id.
pub(crate) fn parse_repositories(root: &Value) -> Result<Vec<RepositoryData>> {
    as_object(root, "the repository map")?
        .values()
        .map(parse_repository)
        .collect()
}

fn parse_repository(value: &Value) -> Result<RepositoryData> {
    let repo = as_object(value, "a repository")?;
    let url = |key: &str| {
        repo.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CmisError::protocol(format!("repository entry has no {}", key)))
    };

    let mut info = RepositoryInfo::new();
    for (key, value) in repo {
        if NON_INFO_KEYS.contains(&key.as_str()) || value.is_object() || value.is_array() {
            continue;
        }
        info.insert(key.clone(), text(value).filter(|s| !s.is_empty()));
    }

    let mut capabilities = Capabilities::new();
    if let Some(caps) = repo.get("capabilities").and_then(Value::as_object) {
        for (key, value) in caps {
            match value {
                Value::Bool(b) => capabilities.insert(key, CapabilityValue::Bool(*b)),
                Value::String(s) => capabilities.insert(key, CapabilityValue::parse(s)),
                _ => {}
            }
        }
    }

    let acl_capability = match repo.get("aclCapabilities") {
        Some(value) if value.is_object() => Some(parse_acl_capability(value)?),
        _ => None,
    };

    Ok(RepositoryData {
        info,
        capabilities,
        acl_capability,
        uri_templates: BTreeMap::new(),
        raw: RawRepository::Json {
            repository_url: url("repositoryUrl")?,
            root_folder_url: url("rootFolderUrl")?,
        },
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireAclCapability {
    supported_permissions: Option<String>,
    propagation: Option<String>,
    permissions: Vec<WirePermission>,
    permission_mapping: Vec<WireMapping>,
}

#[derive(Debug, Deserialize)]
struct WirePermission {
    permission: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WireMapping {
    key: String,
    #[serde(default)]
    permission: Vec<String>,
}

fn parse_acl_capability(value: &Value) -> Result<AclCapability> {
    let wire: WireAclCapability = serde_json::from_value(value.clone())
        .map_err(|e| CmisError::protocol(format!("invalid aclCapabilities: {}", e)))?;
    Ok(AclCapability {
        supported_permissions: wire.supported_permissions,
        propagation: wire.propagation,
        permissions: wire
            .permissions
            .into_iter()
            .map(|p| (p.permission, p.description))
            .collect(),
        mapping: wire
            .permission_mapping
            .into_iter()
            .map(|m| (m.key, m.permission))
            .collect(),
    })
}

// Objects.

pub(crate) fn parse_object(value: &Value) -> Result<ObjectData> {
    let object = as_object(value, "an object")?;
    let properties = if let Some(props) = object.get("properties") {
        parse_properties(props)?
    } else if let Some(props) = object.get("succinctProperties") {
        parse_succinct_properties(props)?
    } else {
        return Err(CmisError::protocol("object has no properties"));
    };

    let mut data = ObjectData::new(properties, RawEntry::Json(value.clone()));
    data.allowable_actions = object
        .get("allowableActions")
        .and_then(Value::as_object)
        .map(parse_allowable_actions);
    data.acl = match object.get("acl") {
        Some(acl) if acl.is_object() => Some(parse_acl(acl)?),
        _ => None,
    };
    Ok(data)
}

fn parse_allowable_actions(actions: &Map<String, Value>) -> AllowableActions {
    actions
        .iter()
        .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
        .collect()
}

fn parse_properties(value: &Value) -> Result<Properties> {
    let mut properties = Properties::new();
    for (key, prop) in as_object(value, "properties")? {
        let id = prop.get("id").and_then(Value::as_str).unwrap_or(key.as_str());
        let property_type = prop.get("type").and_then(Value::as_str).and_then(PropertyType::parse);
        let property_type = match property_type {
            Some(t) => t,
            None => {
                warn!(property = id, "property without a known type, reading it as string");
                PropertyType::String
            }
        };
        let value = decode_value(property_type, prop.get("value").unwrap_or(&Value::Null))?;
        properties.insert(id, value);
    }
    Ok(properties)
}

fn decode_value(property_type: PropertyType, value: &Value) -> Result<PropertyValue> {
    match value {
        Value::Null => Ok(PropertyValue::Null),
        Value::Array(values) => {
            let mut decoded = values
                .iter()
                .map(|v| decode_scalar(property_type, v))
                .filter(|v| !matches!(v, Ok(PropertyValue::Null)))
                .collect::<Result<Vec<_>>>()?;
            Ok(match decoded.len() {
                0 => PropertyValue::Null,
                1 => decoded.remove(0),
                _ => PropertyValue::Multi(decoded),
            })
        }
        scalar => decode_scalar(property_type, scalar),
    }
}

fn decode_scalar(property_type: PropertyType, value: &Value) -> Result<PropertyValue> {
    Ok(match (property_type, value) {
        (_, Value::Null) => PropertyValue::Null,
        (PropertyType::Boolean, Value::Bool(b)) => PropertyValue::Boolean(*b),
        (PropertyType::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => PropertyValue::Integer(i),
            None => {
                return Err(CmisError::protocol(format!("invalid integer property value '{}'", n)))
            }
        },
        (PropertyType::Decimal, Value::Number(n)) => match n.as_f64() {
            Some(d) => PropertyValue::Decimal(d),
            None => {
                return Err(CmisError::protocol(format!("invalid decimal property value '{}'", n)))
            }
        },
        (PropertyType::DateTime, Value::Number(n)) => {
            match n.as_i64().and_then(datetime_from_millis) {
                Some(dt) => PropertyValue::DateTime(dt),
                None => {
                    warn!(value = %n, "unparsable datetime property value");
                    PropertyValue::Null
                }
            }
        }
        (t, Value::String(s)) => t.decode(s)?,
        (t, other) => match text(other) {
            Some(s) => t.decode(&s)?,
            None => {
                return Err(CmisError::protocol(format!(
                    "unexpected JSON for a {} property value",
                    t
                )))
            }
        },
    })
}

/// Bare values; strings stay strings since their type is not on the wire.
/// Standard datetime properties; succinct values carry no type of their own.
const SUCCINCT_DATETIMES: &[&str] = &[
    "cmis:creationDate",
    "cmis:lastModificationDate",
    "cmis:changeTime",
];

fn parse_succinct_properties(value: &Value) -> Result<Properties> {
    let mut properties = Properties::new();
    for (id, value) in as_object(value, "succinctProperties")? {
        let decoded = if SUCCINCT_DATETIMES.contains(&id.as_str()) {
            decode_value(PropertyType::DateTime, value)?
        } else {
            succinct_value(value)
        };
        properties.insert(id.clone(), decoded);
    }
    Ok(properties)
}

fn succinct_value(value: &Value) -> PropertyValue {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => PropertyValue::Integer(i),
            None => n.as_f64().map(PropertyValue::Decimal).unwrap_or(PropertyValue::Null),
        },
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(values) => {
            let mut decoded: Vec<PropertyValue> = values
                .iter()
                .map(succinct_value)
                .filter(|v| !v.is_null())
                .collect();
            match decoded.len() {
                0 => PropertyValue::Null,
                1 => decoded.remove(0),
                _ => PropertyValue::Multi(decoded),
            }
        }
        Value::Object(_) => PropertyValue::Null,
    }
}

// Listings.

fn parse_nav(object: &Map<String, Value>) -> PageNav {
    PageNav {
        has_more_items: object.get("hasMoreItems").and_then(Value::as_bool),
        num_items: object.get("numItems").and_then(Value::as_u64),
        links: BTreeMap::new(),
        linked: false,
    }
}

/// `{"objects": [...], "hasMoreItems": .., "numItems": ..}`.
///
/// Children wrap each object as `{"object": {...}}`; checked-out and
/// relationship listings do not. Both are accepted.
pub(crate) fn parse_object_list(root: &Value) -> Result<Page<ObjectData>> {
    let object = as_object(root, "an object list")?;
    let items = match object.get("objects") {
        Some(objects) => as_array(objects, "objects")?
            .iter()
            .map(|item| parse_object(item.get("object").unwrap_or(item)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Page::new(items, parse_nav(object)))
}

/// `{"results": [...]}` from a query.
pub(crate) fn parse_query_results(root: &Value) -> Result<Page<ObjectData>> {
    let object = as_object(root, "query results")?;
    let items = match object.get("results") {
        Some(results) => as_array(results, "results")?
            .iter()
            .map(parse_object)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Page::new(items, parse_nav(object)))
}

/// A bare array of objects, as returned for versions.
pub(crate) fn parse_object_array(root: &Value) -> Result<Page<ObjectData>> {
    let items = as_array(root, "an object array")?
        .iter()
        .map(parse_object)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, PageNav::default()))
}

/// `[{"object": {...}, "relativePathSegment": ".."}]` from a parents call.
pub(crate) fn parse_parents(root: &Value) -> Result<Vec<ObjectData>> {
    as_array(root, "a parent list")?
        .iter()
        .map(|item| {
            let mut data = parse_object(item.get("object").unwrap_or(item))?;
            data.relative_path_segment = item
                .get("relativePathSegment")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(data)
        })
        .collect()
}

/// A descendants or folder tree, flattened parents first.
///
/// Nodes are `{"object": {"object": {...}}, "children": [...]}`.
pub(crate) fn parse_object_tree(root: &Value) -> Result<Page<ObjectData>> {
    let mut items = Vec::new();
    flatten_tree(root, &mut items, &|node| {
        let wrapper = node
            .get("object")
            .ok_or_else(|| CmisError::protocol("tree node has no object"))?;
        parse_object(wrapper.get("object").unwrap_or(wrapper))
    })?;
    Ok(Page::new(items, PageNav::default()))
}

fn flatten_tree<T>(
    nodes: &Value,
    out: &mut Vec<T>,
    decode: &dyn Fn(&Value) -> Result<T>,
) -> Result<()> {
    for node in as_array(nodes, "a tree")? {
        out.push(decode(node)?);
        if let Some(children) = node.get("children") {
            if !children.is_null() {
                flatten_tree(children, out, decode)?;
            }
        }
    }
    Ok(())
}

// ACLs.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAce {
    principal: WirePrincipal,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default = "default_direct")]
    is_direct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrincipal {
    principal_id: String,
}

fn default_direct() -> bool {
    true
}

/// `{"aces": [...], "isExact": ..}`.
pub(crate) fn parse_acl(value: &Value) -> Result<Acl> {
    let aces = match value.get("aces") {
        Some(aces) if !aces.is_null() => aces.clone(),
        _ => return Ok(Acl::new()),
    };
    let wire: Vec<WireAce> = serde_json::from_value(aces)
        .map_err(|e| CmisError::protocol(format!("invalid ACL: {}", e)))?;
    Ok(Acl::from_entries(
        wire.into_iter()
            .filter(|ace| !ace.permissions.is_empty())
            .map(|ace| Ace::new(ace.principal.principal_id, ace.permissions, ace.is_direct)),
    ))
}

// Types.

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireType {
    id: String,
    local_name: Option<String>,
    local_namespace: Option<String>,
    display_name: Option<String>,
    query_name: Option<String>,
    description: Option<String>,
    base_id: Option<String>,
    parent_id: Option<String>,
    creatable: bool,
    fileable: bool,
    queryable: bool,
    fulltext_indexed: bool,
    included_in_supertype_query: bool,
    controllable_policy: bool,
    #[serde(rename = "controllableACL")]
    controllable_acl: bool,
    property_definitions: Option<BTreeMap<String, WirePropertyDefinition>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WirePropertyDefinition {
    id: String,
    local_name: Option<String>,
    local_namespace: Option<String>,
    display_name: Option<String>,
    query_name: Option<String>,
    description: Option<String>,
    property_type: Option<String>,
    cardinality: Option<String>,
    updatability: Option<String>,
    inherited: bool,
    required: bool,
    queryable: bool,
    orderable: bool,
    open_choice: bool,
}

impl From<WirePropertyDefinition> for PropertyDefinition {
    fn from(wire: WirePropertyDefinition) -> Self {
        PropertyDefinition {
            id: wire.id,
            local_name: wire.local_name,
            local_namespace: wire.local_namespace,
            display_name: wire.display_name,
            query_name: wire.query_name,
            description: wire.description,
            property_type: wire.property_type.as_deref().and_then(PropertyType::parse),
            cardinality: wire.cardinality.as_deref().and_then(Cardinality::parse),
            updatability: wire.updatability.as_deref().and_then(Updatability::parse),
            inherited: wire.inherited,
            required: wire.required,
            queryable: wire.queryable,
            orderable: wire.orderable,
            open_choice: wire.open_choice,
        }
    }
}

pub(crate) fn parse_type(value: &Value) -> Result<TypeDefinition> {
    let wire: WireType = serde_json::from_value(value.clone())
        .map_err(|e| CmisError::protocol(format!("invalid type definition: {}", e)))?;
    if wire.id.is_empty() {
        return Err(CmisError::protocol("type definition has no id"));
    }
    let property_definitions = wire.property_definitions.map(|defs| {
        defs.into_iter()
            .map(|(key, def)| {
                let mut def = PropertyDefinition::from(def);
                if def.id.is_empty() {
                    def.id = key.clone();
                }
                (key, def)
            })
            .collect::<BTreeMap<_, _>>()
    });
    Ok(TypeDefinition {
        id: wire.id,
        local_name: wire.local_name,
        local_namespace: wire.local_namespace,
        display_name: wire.display_name,
        query_name: wire.query_name,
        description: wire.description,
        base_id: wire.base_id.as_deref().and_then(BaseType::parse),
        parent_id: wire.parent_id,
        creatable: wire.creatable,
        fileable: wire.fileable,
        queryable: wire.queryable,
        fulltext_indexed: wire.fulltext_indexed,
        included_in_supertype_query: wire.included_in_supertype_query,
        controllable_policy: wire.controllable_policy,
        controllable_acl: wire.controllable_acl,
        property_definitions: property_definitions.filter(|defs| !defs.is_empty()),
    })
}

/// `{"types": [...]}` from typeChildren.
pub(crate) fn parse_type_list(root: &Value) -> Result<Vec<TypeDefinition>> {
    match root.get("types") {
        Some(types) => as_array(types, "types")?.iter().map(parse_type).collect(),
        None => Ok(Vec::new()),
    }
}

/// `[{"type": {...}, "children": [...]}]` from typeDescendants.
pub(crate) fn parse_type_tree(root: &Value) -> Result<Vec<TypeDefinition>> {
    let mut types = Vec::new();
    flatten_tree(root, &mut types, &|node| {
        parse_type(
            node.get("type")
                .ok_or_else(|| CmisError::protocol("type tree node has no type"))?,
        )
    })?;
    Ok(types)
}

// Changes.

pub(crate) fn parse_change_list(root: &Value) -> Result<Page<ChangeEntry>> {
    let object = as_object(root, "a change list")?;
    let items = match object.get("objects") {
        Some(objects) => as_array(objects, "objects")?
            .iter()
            .map(parse_change_entry)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Page::new(items, parse_nav(object)))
}

fn parse_change_entry(value: &Value) -> Result<ChangeEntry> {
    let data = parse_object(value)?;
    let info = value.get("changeEventInfo");
    let change_time = info
        .and_then(|i| i.get("changeTime"))
        .and_then(Value::as_i64)
        .and_then(datetime_from_millis);
    let object_id = data.object_id();
    // no entry id on the wire
    let id = match (&object_id, info.and_then(|i| i.get("changeTime")).and_then(text)) {
        (Some(oid), Some(time)) => format!("{}@{}", oid, time),
        (Some(oid), None) => oid.to_string(),
        (None, _) => String::new(),
    };
    Ok(ChangeEntry {
        id,
        object_id,
        change_type: ChangeType::parse(
            info.and_then(|i| i.get("changeType"))
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        change_time,
        properties: data.properties,
        acl: data.acl,
    })
}

// Renditions.

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireRendition {
    stream_id: Option<String>,
    mime_type: Option<String>,
    length: Option<i64>,
    title: Option<String>,
    kind: Option<String>,
    height: Option<i64>,
    width: Option<i64>,
    rendition_document_id: Option<String>,
}

pub(crate) fn parse_renditions(root: &Value) -> Result<Vec<Rendition>> {
    let wire: Vec<WireRendition> = match root {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other.clone())
            .map_err(|e| CmisError::protocol(format!("invalid renditions: {}", e)))?,
    };
    Ok(wire
        .into_iter()
        .map(|r| Rendition {
            stream_id: r.stream_id,
            mime_type: r.mime_type,
            length: r.length,
            title: r.title,
            kind: r.kind,
            height: r.height,
            width: r.width,
            href: None,
            rendition_document_id: r.rendition_document_id,
        })
        .collect())
}
