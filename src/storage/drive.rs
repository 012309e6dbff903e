//! Drive record built from a Redfish `Drive` resource.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Nvme,
    Sas,
    Other(String),
}

impl MediaType {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "nvme" => MediaType::Nvme,
            "sas" => MediaType::Sas,
            other => MediaType::Other(other.to_string()),
        }
    }

    /// Lower-case name used in the `type` label.
    pub fn label(&self) -> &str {
        match self {
            MediaType::Nvme => "nvme",
            MediaType::Sas => "sas",
            MediaType::Other(name) => name,
        }
    }
}

/// One physical drive discovered during a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveRecord {
    /// `@odata.id` of the drive resource
    pub path: String,
    pub media_type: MediaType,
    pub id: String,
    pub serial_number: Option<String>,
    pub model: String,
    /// `Status.State`, verbatim
    pub status_state: Option<String>,
    /// `Oem.SmartData` in source order; `None` when the drive reports no SMART block
    pub smart_attributes: Option<Vec<(String, String)>>,
    pub disk_name: Option<String>,
}

impl DriveRecord {
    pub fn from_resource(path: &str, resource: &Map<String, Value>) -> Self {
        let text = |key: &str| resource.get(key).and_then(Value::as_str).map(str::to_string);

        let smart_attributes = resource
            .get("Oem")
            .and_then(|oem| oem.get("SmartData"))
            .and_then(Value::as_object)
            .filter(|data| !data.is_empty())
            .map(|data| {
                data.iter()
                    .filter_map(|(key, value)| scalar_text(value).map(|v| (key.clone(), v)))
                    .collect::<Vec<_>>()
            });

        let disk_name = smart_attributes
            .as_ref()
            .and_then(|attrs| disk_name_from_keys(attrs.iter().map(|(k, _)| k.as_str())));

        Self {
            path: path.to_string(),
            media_type: MediaType::parse(&text("MediaType").unwrap_or_default()),
            id: text("Id").unwrap_or_default(),
            serial_number: text("SerialNumber"),
            model: text("Model").unwrap_or_default(),
            status_state: status_state(resource),
            smart_attributes,
            disk_name,
        }
    }

    /// `/dev/<name>`, or empty when no disk name was reported.
    pub fn device_path(&self) -> String {
        self.disk_name
            .as_ref()
            .map(|name| format!("/dev/{}", name))
            .unwrap_or_default()
    }
}

/// Token between the first `[` and the following `]` of the first key that
/// carries both brackets, e.g. `smart[nvme0n1]_temperature` -> `nvme0n1`.
pub fn disk_name_from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Option<String> {
    keys.into_iter()
        .find(|key| key.contains('[') && key.contains(']'))
        .and_then(|key| key.split_once('['))
        .and_then(|(_, rest)| rest.split(']').next())
        .map(str::to_string)
}

/// `Status.State`, matching the `State` key case-insensitively.
fn status_state(resource: &Map<String, Value>) -> Option<String> {
    resource
        .get("Status")
        .and_then(Value::as_object)?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("state"))
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn disk_name_is_taken_from_first_bracketed_key() {
        let keys = ["model", "foo[sdb]bar", "x[sdc]"];
        assert_eq!(disk_name_from_keys(keys).as_deref(), Some("sdb"));
        assert_eq!(disk_name_from_keys(["no brackets"]), None);
        assert_eq!(disk_name_from_keys(["[]"]).as_deref(), Some(""));
    }

    #[test]
    fn builds_record_from_nvme_drive() {
        let resource = object(json!({
            "@odata.id": "/redfish/v1/Drives/0",
            "Id": "S4EVNX0N",
            "Model": "SAMSUNG MZQLB",
            "MediaType": "NVMe",
            "Status": {"State": "OK", "Health": "OK"},
            "Oem": {"SmartData": {
                "disk[nvme0n1] temperature": "38 C",
                "power_on_hours": 12345,
                "nested": {"skip": true}
            }}
        }));

        let drive = DriveRecord::from_resource("/redfish/v1/Drives/0", &resource);
        assert_eq!(drive.media_type, MediaType::Nvme);
        assert_eq!(drive.id, "S4EVNX0N");
        assert_eq!(drive.status_state.as_deref(), Some("OK"));
        assert_eq!(drive.disk_name.as_deref(), Some("nvme0n1"));
        assert_eq!(drive.device_path(), "/dev/nvme0n1");
        assert_eq!(
            drive.smart_attributes,
            Some(vec![
                ("disk[nvme0n1] temperature".to_string(), "38 C".to_string()),
                ("power_on_hours".to_string(), "12345".to_string()),
            ])
        );
    }

    #[test]
    fn missing_or_empty_smart_block_is_none() {
        let bare = object(json!({"MediaType": "SAS", "Status": {"state": "Enabled"}}));
        let drive = DriveRecord::from_resource("/d", &bare);
        assert_eq!(drive.smart_attributes, None);
        assert_eq!(drive.status_state.as_deref(), Some("Enabled"));
        assert_eq!(drive.device_path(), "");

        let empty = object(json!({"MediaType": "SAS", "Oem": {"SmartData": {}}}));
        assert_eq!(DriveRecord::from_resource("/d", &empty).smart_attributes, None);
    }

    #[test]
    fn media_type_labels_are_lower_case() {
        assert_eq!(MediaType::parse("NVMe").label(), "nvme");
        assert_eq!(MediaType::parse("SSD"), MediaType::Other("ssd".to_string()));
    }
}
