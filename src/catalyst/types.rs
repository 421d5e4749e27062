use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Catalyst Center API types ---

/// Intent API envelope: `{"response": ..., "version": "..."}`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

#[derive(Debug, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "Token")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDevice {
    pub id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub management_ip_address: Option<String>,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub reachability_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site_name_hierarchy: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// --- Deploy ---

/// DeployRequest is what API callers send to push a template to devices
#[derive(Debug, Clone, Deserialize)]
pub struct DeployRequest {
    pub template_id: String,
    #[serde(default)]
    pub target_devices: Vec<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Wire body for `template-programmer/template/deploy`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDeployment {
    pub template_id: String,
    pub force_push_template: bool,
    pub target_info: Vec<TargetInfo>,
}

#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub params: Map<String, Value>,
}

impl From<&DeployRequest> for TemplateDeployment {
    fn from(req: &DeployRequest) -> Self {
        Self {
            template_id: req.template_id.clone(),
            force_push_template: false,
            target_info: req
                .target_devices
                .iter()
                .map(|id| TargetInfo {
                    id: id.clone(),
                    target_type: "MANAGED_DEVICE_UUID".to_string(),
                    params: req.parameters.clone(),
                })
                .collect(),
        }
    }
}
