use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::de::{
    config_lines, lenient_opt_string, lenient_string, null_as_default, one_or_many, scalar_text,
};

/// On-disk format of a template file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Yaml,
    Json,
}

impl FileType {
    /// Lookup order when a template is addressed by stem only
    pub const SEARCH_ORDER: [FileType; 2] = [FileType::Yaml, FileType::Json];

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Yaml => "yaml",
            FileType::Json => "json",
        }
    }

    /// Map a file extension (without the dot) to a file type.
    /// `yml` is accepted as YAML.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(FileType::Yaml),
            "json" => Some(FileType::Json),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FileType::Yaml => "application/x-yaml",
            FileType::Json => "application/json",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(FileType::Yaml),
            "json" => Ok(FileType::Json),
            other => Err(format!("unknown file type: {}", other)),
        }
    }
}

/// Template is one configuration template file, normalized from YAML or JSON.
///
/// YAML files map their top-level keys directly onto this struct; keys it
/// does not know are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "template_name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "template_description", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "config_lines")]
    pub configuration: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<TemplateParameter>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_types: Vec<DeviceType>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub software_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub software_variant: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    // Provenance, injected by the store after parsing
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_type: FileType,
    #[serde(default)]
    pub file_path: String,
}

impl Template {
    /// Lowercased text the catalog search matches against
    pub fn searchable_text(&self) -> String {
        let tags: Vec<String> = self.tags.iter().map(Tag::label).collect();
        let device_types: Vec<String> = self
            .device_types
            .iter()
            .flat_map(DeviceType::search_names)
            .collect();

        [
            self.name.as_str(),
            self.description.as_str(),
            &tags.join(" "),
            self.author.as_str(),
            &device_types.join(" "),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Configuration body as one block of text
    pub fn configuration_text(&self) -> String {
        self.configuration.join("\n")
    }
}

/// TemplateParameter describes one substitution variable of a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tag is either a bare string or an exported tag object carrying `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Name(String),
    Object(Map<String, Value>),
    Other(Value),
}

impl Tag {
    pub fn label(&self) -> String {
        match self {
            Tag::Name(name) => name.clone(),
            Tag::Object(obj) => match obj.get("name") {
                Some(name) => scalar_text(name),
                None => Value::Object(obj.clone()).to_string(),
            },
            Tag::Other(value) => scalar_text(value),
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Name(name.to_string())
    }
}

/// DeviceType is a bare product name or a Catalyst Center product descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceType {
    Name(String),
    Product(Map<String, Value>),
    Other(Value),
}

impl DeviceType {
    /// Names the search index sees: family and series for product descriptors
    pub fn search_names(&self) -> Vec<String> {
        match self {
            DeviceType::Name(name) => vec![name.clone()],
            DeviceType::Product(obj) => ["productFamily", "productSeries"]
                .iter()
                .map(|key| obj.get(*key).map(scalar_text).unwrap_or_default())
                .collect(),
            DeviceType::Other(value) => vec![scalar_text(value)],
        }
    }
}

/// RenderRequest asks for one template to be expanded with parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Map<String, Value>,
}

/// RenderResponse carries rendered text, or the render error embedded as text
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub success: bool,
    pub rendered_config: String,
    pub template_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// PreviewResponse returns the raw file content of a template
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub content: String,
    pub filename: String,
    pub file_type: FileType,
}

/// BulkDownloadRequest lists templates as `category:filename` ids
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDownloadRequest {
    #[serde(default)]
    pub templates: Vec<String>,
}

/// MoveTemplateRequest relocates one file between categories
#[derive(Debug, Clone, Deserialize)]
pub struct MoveTemplateRequest {
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub from_category: Option<String>,
    #[serde(default)]
    pub to_category: Option<String>,
}

/// UploadResponse reports where an uploaded file was stored
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub category: String,
}
