//! Template file parsing.
//!
//! YAML files map directly onto [`Template`]. JSON files come in several
//! legacy shapes (hand-written objects, Catalyst Center project exports,
//! template exports), which are classified into a [`JsonShape`] first and
//! then normalized into one canonical [`Template`].

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::models::de::{
    lenient_opt_string, null_as_default, object_entries, opt_one_or_many, scalar_text, split_lines,
};
use crate::models::{DeviceType, Tag, Template, TemplateParameter};

/// Files whose trimmed content is shorter than this are treated as placeholders
pub const MIN_CONTENT_LEN: usize = 10;

pub const DEFAULT_DESCRIPTION: &str = "Community template";
pub const DEFAULT_AUTHOR: &str = "Community";
pub const DEFAULT_VERSION: &str = "1.0";
pub const DEFAULT_TAG: &str = "community";

/// Result of reading one template file
#[derive(Debug)]
pub enum LoadOutcome {
    Found(Box<Template>),
    /// No file at the path
    Absent,
    /// File exists but does not hold a usable template
    Skipped(SkipReason),
}

impl LoadOutcome {
    pub fn into_template(self) -> Option<Template> {
        match self {
            LoadOutcome::Found(template) => Some(*template),
            LoadOutcome::Absent | LoadOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Trimmed content shorter than [`MIN_CONTENT_LEN`]
    TooShort,
    /// Syntax or schema error
    Malformed(String),
    /// Valid JSON that is not one of the recognized template shapes
    UnsupportedShape(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooShort => write!(f, "content too short"),
            SkipReason::Malformed(msg) => write!(f, "malformed: {}", msg),
            SkipReason::UnsupportedShape(kind) => write!(f, "unsupported shape: {}", kind),
        }
    }
}

/// Recognized layouts of a JSON template file
#[derive(Debug)]
pub enum JsonShape {
    /// A single template object
    Bare(Map<String, Value>),
    /// `[{"name": ..., "templates": [ {template}, ... ]}, ...]`
    ProjectExport(Map<String, Value>),
    /// `[ {template}, ... ]`
    TemplateList(Map<String, Value>),
    Unsupported(&'static str),
}

impl JsonShape {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(obj) => JsonShape::Bare(obj),
            Value::Array(items) => match items.into_iter().next() {
                None => JsonShape::Unsupported("empty array"),
                Some(Value::Object(mut first)) => match first.remove("templates") {
                    Some(Value::Array(nested)) => match nested.into_iter().next() {
                        Some(Value::Object(template)) => JsonShape::ProjectExport(template),
                        Some(_) => JsonShape::Unsupported("project template is not an object"),
                        None => JsonShape::Unsupported("project without templates"),
                    },
                    Some(_) => JsonShape::Unsupported("project templates is not an array"),
                    None => JsonShape::TemplateList(first),
                },
                Some(_) => JsonShape::Unsupported("array of non-objects"),
            },
            Value::String(_) => JsonShape::Unsupported("string"),
            Value::Number(_) => JsonShape::Unsupported("number"),
            Value::Bool(_) => JsonShape::Unsupported("boolean"),
            Value::Null => JsonShape::Unsupported("null"),
        }
    }

    fn into_object(self) -> Result<Map<String, Value>, SkipReason> {
        match self {
            JsonShape::Bare(obj) | JsonShape::ProjectExport(obj) | JsonShape::TemplateList(obj) => {
                Ok(obj)
            }
            JsonShape::Unsupported(kind) => Err(SkipReason::UnsupportedShape(kind)),
        }
    }
}

/// Catalyst Center style template object, as found in JSON exports
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedTemplate {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    template_content: Option<String>,
    #[serde(default, deserialize_with = "object_entries")]
    template_params: Vec<Map<String, Value>>,
    #[serde(default, deserialize_with = "opt_one_or_many")]
    tags: Option<Vec<Tag>>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    device_types: Vec<DeviceType>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    software_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    software_variant: Option<String>,
}

impl ExportedTemplate {
    fn into_template(self, stem: &str) -> Template {
        Template {
            name: self.name.unwrap_or_else(|| stem.to_string()),
            description: self
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            configuration: self
                .template_content
                .as_deref()
                .map(split_lines)
                .unwrap_or_default(),
            parameters: self.template_params.into_iter().map(exported_param).collect(),
            tags: self
                .tags
                .unwrap_or_else(|| vec![Tag::from(DEFAULT_TAG)]),
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            device_types: self.device_types,
            software_type: self.software_type,
            software_variant: self.software_variant,
            ..Default::default()
        }
    }
}

/// Map a Catalyst Center `templateParams` entry onto a parameter descriptor
fn exported_param(mut raw: Map<String, Value>) -> TemplateParameter {
    let name = take_first(&mut raw, &["parameterName", "name"])
        .map(|v| scalar_text(&v))
        .unwrap_or_default();
    let param_type = take_first(&mut raw, &["dataType", "type"]).map(|v| scalar_text(&v));
    let default = take_first(&mut raw, &["defaultValue", "default"]);

    TemplateParameter {
        name,
        param_type,
        default,
        extra: raw,
    }
}

/// Remove every key in `keys` and return the first non-null value found
fn take_first(raw: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| raw.remove(*key))
        .fold(None, |found, value| found.or(Some(value).filter(|v| !v.is_null())))
}

/// Parse a YAML template document
pub fn parse_yaml(content: &str) -> Result<Template, SkipReason> {
    serde_yaml::from_str::<Template>(content).map_err(|e| SkipReason::Malformed(e.to_string()))
}

/// Parse and normalize a JSON template document. `stem` names the template
/// when the document carries no `name`.
pub fn parse_json(content: &str, stem: &str) -> Result<Template, SkipReason> {
    let trimmed = content.trim();
    if trimmed.len() < MIN_CONTENT_LEN {
        return Err(SkipReason::TooShort);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| SkipReason::Malformed(e.to_string()))?;
    let object = JsonShape::classify(value).into_object()?;
    let exported: ExportedTemplate = serde_json::from_value(Value::Object(object))
        .map_err(|e| SkipReason::Malformed(e.to_string()))?;

    Ok(exported.into_template(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_json_is_skipped() {
        assert_eq!(parse_json("{}", "x").unwrap_err(), SkipReason::TooShort);
        assert_eq!(parse_json("   [ ]   \n", "x").unwrap_err(), SkipReason::TooShort);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_json("this is not json at all", "x").unwrap_err();
        assert!(matches!(err, SkipReason::Malformed(_)));
    }

    #[test]
    fn test_json_string_is_unsupported() {
        let err = parse_json(r#""just a quoted string""#, "x").unwrap_err();
        assert_eq!(err, SkipReason::UnsupportedShape("string"));
    }

    #[test]
    fn test_bare_object_defaults() {
        let t = parse_json(r#"{"templateContent": "hostname {{ name }}\nend"}"#, "edge").unwrap();
        assert_eq!(t.name, "edge");
        assert_eq!(t.description, DEFAULT_DESCRIPTION);
        assert_eq!(t.configuration, vec!["hostname {{ name }}", "end"]);
        assert_eq!(t.tags, vec![Tag::from("community")]);
        assert_eq!(t.author, DEFAULT_AUTHOR);
        assert_eq!(t.version, DEFAULT_VERSION);
        assert!(t.parameters.is_empty());
    }

    #[test]
    fn test_project_export_takes_first_nested_template() {
        let doc = json!([{
            "name": "Campus Project",
            "templates": [
                {"name": "vlan-baseline", "templateContent": "vlan 10", "version": 2},
                {"name": "second"}
            ]
        }]);
        let t = parse_json(&doc.to_string(), "project").unwrap();
        assert_eq!(t.name, "vlan-baseline");
        assert_eq!(t.configuration, vec!["vlan 10"]);
        assert_eq!(t.version, "2");
    }

    #[test]
    fn test_project_export_without_templates_is_unsupported() {
        let doc = json!([{"name": "Empty Project", "templates": []}]);
        let err = parse_json(&doc.to_string(), "project").unwrap_err();
        assert_eq!(err, SkipReason::UnsupportedShape("project without templates"));
    }

    #[test]
    fn test_template_list_takes_first_element() {
        let doc = json!([
            {"name": "first", "author": "NetOps", "tags": [{"id": "1", "name": "wan"}]},
            {"name": "second"}
        ]);
        let t = parse_json(&doc.to_string(), "list").unwrap();
        assert_eq!(t.name, "first");
        assert_eq!(t.author, "NetOps");
        assert_eq!(t.tags[0].label(), "wan");
    }

    #[test]
    fn test_empty_array_is_unsupported() {
        let err = parse_json("[          ]", "x").unwrap_err();
        assert_eq!(err, SkipReason::UnsupportedShape("empty array"));
    }

    #[test]
    fn test_exported_params_are_mapped() {
        let doc = json!({
            "name": "ntp",
            "templateParams": [
                {"parameterName": "ntp_server", "dataType": "STRING", "defaultValue": "10.0.0.1", "required": true}
            ]
        });
        let t = parse_json(&doc.to_string(), "ntp").unwrap();
        let p = &t.parameters[0];
        assert_eq!(p.name, "ntp_server");
        assert_eq!(p.param_type.as_deref(), Some("STRING"));
        assert_eq!(p.default, Some(json!("10.0.0.1")));
        assert_eq!(p.extra.get("required"), Some(&json!(true)));
    }

    #[test]
    fn test_loose_field_types_keep_the_template() {
        let doc = json!({
            "name": "wan edge",
            "tags": "wan",
            "templateParams": ["stray", {"parameterName": "asn"}, null]
        });
        let t = parse_json(&doc.to_string(), "edge").unwrap();
        assert_eq!(t.tags.len(), 1);
        assert_eq!(t.tags[0].label(), "wan");
        assert_eq!(t.parameters.len(), 1);
        assert_eq!(t.parameters[0].name, "asn");

        let t = parse_yaml("template_name: single\ntags: campus\n").unwrap();
        assert_eq!(t.tags[0].label(), "campus");
    }

    #[test]
    fn test_yaml_maps_fields_directly() {
        let yaml = r#"
template_name: Basic Switch
template_description: Access switch baseline
version: 1.0
author: NetOps
tags: [switching, access]
configuration:
  - hostname {{ hostname }}
  - vlan {{ vlan }}
parameters:
  - name: hostname
    type: string
  - name: vlan
    type: integer
    default: 10
maintainer: lab-team
"#;
        let t = parse_yaml(yaml).unwrap();
        assert_eq!(t.name, "Basic Switch");
        assert_eq!(t.version, "1.0");
        assert_eq!(t.configuration.len(), 2);
        assert_eq!(t.parameters[1].default, Some(json!(10)));
        assert_eq!(t.extra.get("maintainer"), Some(&json!("lab-team")));
    }

    #[test]
    fn test_yaml_that_is_not_a_mapping_is_malformed() {
        assert!(matches!(parse_yaml("just a line of text"), Err(SkipReason::Malformed(_))));
    }
}
