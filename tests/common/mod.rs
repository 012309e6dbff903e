//! Scripted in-memory Redfish controller for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use redfish_smart_exporter::config::ExporterConfig;
use redfish_smart_exporter::redfish::{
    RedfishClient, RedfishTransport, RequestAuth, Target, TransportError, TransportResponse,
};

pub const ADDRESS: &str = "10.0.0.1";
pub const HOST: &str = "bmc01";
pub const TOKEN: &str = "token-1234";
pub const SESSION_PATH: &str = "/redfish/v1/SessionService/Sessions/1";

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Fail(TransportError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub auth: RequestAuth,
}

#[derive(Default)]
pub struct FakeBmc {
    routes: Mutex<HashMap<String, Reply>>,
    basic_routes: Mutex<HashMap<String, Reply>>,
    posts: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeBmc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn json(&self, path: &str, body: Value) {
        self.route(path, Reply::Json(body));
    }

    /// Reply for GETs of `path` that carry basic credentials. Takes
    /// precedence over `route` for those requests only.
    pub fn route_basic(&self, path: &str, reply: Reply) {
        self.basic_routes.lock().unwrap().insert(path.to_string(), reply);
    }

    /// Queue the response for the next session POST. Unqueued POSTs get HTTP 500.
    pub fn queue_post(&self, response: Result<TransportResponse, TransportError>) {
        self.posts.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    fn record(&self, method: &'static str, url: &str, auth: RequestAuth) -> String {
        let path = path_of(url);
        self.requests.lock().unwrap().push(Request {
            method,
            path: path.clone(),
            auth,
        });
        path
    }
}

fn path_of(url: &str) -> String {
    Url::parse(url).unwrap().path().to_string()
}

fn respond(reply: Reply) -> Result<TransportResponse, TransportError> {
    match reply {
        Reply::Json(body) => Ok(TransportResponse {
            status: 200,
            headers: HashMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        }),
        Reply::Status(status) => Ok(TransportResponse {
            status,
            ..Default::default()
        }),
        Reply::Fail(error) => Err(error),
    }
}

#[async_trait]
impl RedfishTransport for FakeBmc {
    async fn get(&self, url: &str, auth: &RequestAuth) -> Result<TransportResponse, TransportError> {
        let path = self.record("GET", url, auth.clone());
        let basic = match auth {
            RequestAuth::Basic { .. } => self.basic_routes.lock().unwrap().get(&path).cloned(),
            _ => None,
        };
        let reply = basic.or_else(|| self.routes.lock().unwrap().get(&path).cloned());
        respond(reply.unwrap_or(Reply::Status(404)))
    }

    async fn post_json(&self, url: &str, _body: &Value) -> Result<TransportResponse, TransportError> {
        self.record("POST", url, RequestAuth::None);
        let queued = self.posts.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| respond(Reply::Status(500)))
    }

    async fn delete(&self, url: &str, auth: &RequestAuth) -> Result<TransportResponse, TransportError> {
        self.record("DELETE", url, auth.clone());
        respond(Reply::Status(204))
    }
}

/// Successful session POST carrying a token and the session resource.
pub fn session_created() -> Result<TransportResponse, TransportError> {
    let mut headers = HashMap::new();
    headers.insert("x-auth-token".to_string(), TOKEN.to_string());
    Ok(TransportResponse {
        status: 201,
        headers,
        body: serde_json::to_vec(&json!({ "@odata.id": SESSION_PATH })).unwrap(),
    })
}

pub fn config() -> ExporterConfig {
    ExporterConfig {
        username: "admin".to_string(),
        password: "secret".to_string(),
        ..ExporterConfig::default()
    }
}

pub fn target(config: &ExporterConfig) -> Target {
    Target::from_config(ADDRESS, HOST, config)
}

pub fn client(transport: Arc<dyn RedfishTransport>) -> RedfishClient {
    RedfishClient::new(target(&config()), transport)
}

pub fn service_root() -> Value {
    json!({
        "@odata.id": "/redfish/v1",
        "SessionService": { "@odata.id": "/redfish/v1/SessionService" },
        "StorageServices": { "@odata.id": "/redfish/v1/StorageServices" }
    })
}

fn members(key: &str, paths: &[&str]) -> Value {
    let entries: Vec<Value> = paths.iter().map(|p| json!({ key: p })).collect();
    json!({ "Members": entries })
}

pub fn nvme_drive(path: &str) -> Value {
    json!({
        "@odata.id": path,
        "Id": "NVME-0",
        "SerialNumber": "S4EVNX0N",
        "Model": "SAMSUNG MZQLB7T6",
        "MediaType": "NVMe",
        "Status": { "State": "OK", "Health": "OK" },
        "Oem": { "SmartData": {
            "smart[nvme0n1] temperature": "38 C",
            "power_on_hours": "12345",
            "percentage_used": "73%",
            "power_cycles": "41",
            "unsafe_shutdowns": "3",
            "available_spare": "100%",
            "available_spare_threshold": "10%",
            "firmware_version": "GDC5602Q"
        }}
    })
}

pub fn sas_drive(path: &str) -> Value {
    json!({
        "@odata.id": path,
        "Id": "SAS-1",
        "Model": "HGST HUH721212AL",
        "MediaType": "SAS",
        "Status": { "State": "Enabled" },
        "Oem": { "SmartData": {
            "disk[sdb] grown_defects": "2",
            "power_on_hours": "40001",
            "Temperature": "31"
        }}
    })
}

/// Storage tree with two pools: the first one's CapacitySources is missing
/// (404), the second one provides an NVMe, a SAS, an unsupported SSD and a
/// `NULL` drive link. Members are keyed with `key`.
pub fn storage_tree(bmc: &FakeBmc, key: &str) {
    let ss = "/redfish/v1/StorageServices/ss0";
    let pools = format!("{}/StoragePools", ss);
    let p0 = format!("{}/p0", pools);
    let p1 = format!("{}/p1", pools);
    let c0 = format!("{}/CapacitySources/c0", p1);
    let drives = format!("{}/ProvidingDrives", c0);
    let d0 = "/redfish/v1/Chassis/e0/Drives/d0";
    let d1 = "/redfish/v1/Chassis/e0/Drives/d1";
    let d2 = "/redfish/v1/Chassis/e0/Drives/d2";

    bmc.json("/redfish/v1", service_root());
    bmc.json("/redfish/v1/StorageServices", members(key, &[ss]));
    bmc.json(ss, json!({ "@odata.id": ss, "StoragePools": { "@odata.id": pools } }));
    bmc.json(&pools, members(key, &[&p0, &p1]));
    bmc.json(&p0, json!({ "@odata.id": p0, "CapacitySources": [{}] }));
    bmc.json(&p1, json!({ "@odata.id": p1, "CapacitySources": [{}] }));
    bmc.json(&format!("{}/CapacitySources", p1), members(key, &[&c0]));
    bmc.json(&c0, json!({ "@odata.id": c0, "ProvidingDrives": { "@odata.id": drives } }));
    bmc.json(
        &drives,
        members(key, &[d0, d1, d2, "/redfish/v1/Chassis/e0/Drives/NULL"]),
    );
    bmc.json(d0, nvme_drive(d0));
    bmc.json(d1, sas_drive(d1));
    bmc.json(d2, json!({ "@odata.id": d2, "MediaType": "SSD", "Status": { "State": "OK" } }));
}
