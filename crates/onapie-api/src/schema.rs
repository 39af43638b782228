//! Form schema flattening.
//!
//! A form definition (`GET <forms>/<pk>/form.json`) is a tree of fields and
//! groups. [`FormSchema`] keeps that tree and an index of every node by its
//! xpath (`group/sub/name`), which is how submitted data keys its values.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Field label: plain text, or a map of language name to text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Translations(BTreeMap<String, String>),
}

#[derive(Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    label: Option<Label>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
}

#[derive(Deserialize)]
struct RawForm {
    #[serde(default)]
    id_string: Option<String>,
    #[serde(default)]
    default_language: Option<String>,
    children: Vec<RawNode>,
}

/// One field or group in a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub name: String,
    pub label: Option<Label>,
    pub kind: Option<String>,
    pub xpath: String,
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    fn build(raw: RawNode, parents: &[&str]) -> Self {
        let xpath = if parents.is_empty() {
            raw.name.clone()
        } else {
            format!("{}/{}", parents.join("/"), raw.name)
        };
        let mut lineage = parents.to_vec();
        lineage.push(&raw.name);
        let children = raw
            .children
            .into_iter()
            .map(|child| Self::build(child, &lineage))
            .collect();
        Self {
            name: raw.name.clone(),
            label: raw.label,
            kind: raw.kind,
            xpath,
            children,
        }
    }

    /// Label in `language`, else the `default` translation, else the first
    /// translation, else the field name.
    pub fn label(&self, language: Option<&str>) -> &str {
        match &self.label {
            Some(Label::Text(text)) => text,
            Some(Label::Translations(map)) => language
                .and_then(|lang| map.get(lang))
                .or_else(|| map.get("default"))
                .or_else(|| map.values().next())
                .map_or(self.name.as_str(), String::as_str),
            None => &self.name,
        }
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A form definition with every node indexed by xpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    pub id_string: Option<String>,
    pub default_language: Option<String>,
    pub children: Vec<SchemaNode>,
    fields: BTreeMap<String, SchemaNode>,
}

impl FormSchema {
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let body = value.to_string();
        let raw: RawForm = serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("invalid form schema: {e}"),
            body,
        })?;
        let children: Vec<SchemaNode> = raw
            .children
            .into_iter()
            .map(|node| SchemaNode::build(node, &[]))
            .collect();
        let mut fields = BTreeMap::new();
        index(&children, &mut fields);
        Ok(Self {
            id_string: raw.id_string,
            default_language: raw.default_language,
            children,
            fields,
        })
    }

    /// The node at `xpath`, at any depth.
    pub fn field(&self, xpath: &str) -> Option<&SchemaNode> {
        self.fields.get(xpath)
    }

    /// Every xpath in the form, sorted.
    pub fn xpaths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Label of a field in the form's default language.
    pub fn label_of(&self, xpath: &str) -> Option<&str> {
        self.field(xpath)
            .map(|node| node.label(self.default_language.as_deref()))
    }
}

fn index(nodes: &[SchemaNode], fields: &mut BTreeMap<String, SchemaNode>) {
    for node in nodes {
        fields.insert(node.xpath.clone(), node.clone());
        index(&node.children, fields);
    }
}
