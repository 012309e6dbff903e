//! Depth-first discovery of physical drives:
//! StorageServices -> StoragePools -> CapacitySources -> ProvidingDrives.
//!
//! The walker is a pull-based state machine. Each `next_drive` call resumes
//! where the previous one stopped, so drives come out in source-collection
//! order and requests are issued strictly one at a time.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{ExporterConfig, LinkFilterMode};
use crate::redfish::{AuthOverride, FetchOutcome, RedfishClient, REDFISH_ROOT};
use crate::storage::drive::{DriveRecord, MediaType};

const REDFISH_PREFIX: &str = "/redfish/v1/";
const NULL_SUFFIX: &str = "NULL";
const SKIPPED_SERVICE_PREFIX: &str = "lustre-";

/// A `(relation, path)` pair taken from a collection's `Members` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub relation: String,
    pub path: String,
}

/// Discovery level of the members currently being visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    StorageService,
    StoragePool,
    CapacitySource,
    Drive,
}

impl Level {
    fn name(self) -> &'static str {
        match self {
            Level::StorageService => "Storage service",
            Level::StoragePool => "Storage pool",
            Level::CapacitySource => "Capacity source",
            Level::Drive => "Providing drive",
        }
    }

    /// Field naming the child collection, and the level of its members.
    fn child(self) -> Option<(&'static str, Level)> {
        match self {
            Level::StorageService => Some(("StoragePools", Level::StoragePool)),
            Level::StoragePool => Some(("CapacitySources", Level::CapacitySource)),
            Level::CapacitySource => Some(("ProvidingDrives", Level::Drive)),
            Level::Drive => None,
        }
    }
}

/// Link acceptance rule. One strategy per deployment, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFilter {
    /// Path must live under `/redfish/v1/` and must not end in `NULL`.
    /// Storage services named `lustre-*` are skipped.
    PathPrefix,
    /// The member key must start with one of the given prefixes and point
    /// below the Redfish root.
    KeyPrefix(Vec<String>),
}

impl LinkFilter {
    pub fn from_config(config: &ExporterConfig) -> Self {
        match config.link_filter {
            LinkFilterMode::Path => LinkFilter::PathPrefix,
            LinkFilterMode::KeyPrefix => LinkFilter::KeyPrefix(config.link_key_prefixes.clone()),
        }
    }

    pub fn accepts(&self, level: Level, link: &ResourceLink) -> bool {
        match self {
            LinkFilter::PathPrefix => {
                if !link.path.starts_with(REDFISH_PREFIX) || link.path.ends_with(NULL_SUFFIX) {
                    return false;
                }
                let last_segment = link.path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
                !(level == Level::StorageService && last_segment.starts_with(SKIPPED_SERVICE_PREFIX))
            }
            LinkFilter::KeyPrefix(prefixes) => {
                link.path.starts_with(REDFISH_ROOT) && prefixes.iter().any(|p| link.relation.starts_with(p.as_str()))
            }
        }
    }
}

struct Frame {
    level: Level,
    members: VecDeque<ResourceLink>,
}

/// One-pass, non-restartable drive discovery for a single cycle.
pub struct DriveWalker {
    filter: LinkFilter,
    root: Option<String>,
    stack: Vec<Frame>,
}

impl DriveWalker {
    pub fn new(storage_services_path: impl Into<String>, filter: LinkFilter) -> Self {
        Self {
            filter,
            root: Some(storage_services_path.into()),
            stack: Vec::new(),
        }
    }

    /// Next supported drive, or `None` once the tree is exhausted.
    /// Unreachable branches, malformed links and unsupported media are skipped.
    pub async fn next_drive(&mut self, client: &mut RedfishClient) -> Option<DriveRecord> {
        if let Some(root) = self.root.take() {
            debug!("Target {}: Get the SMART data.", client.target().address);
            self.open_collection(client, &root, Level::StorageService).await;
        }

        loop {
            let (level, next) = match self.stack.last_mut() {
                Some(frame) => (frame.level, frame.members.pop_front()),
                None => return None,
            };
            let Some(link) = next else {
                self.stack.pop();
                continue;
            };

            let address = client.target().address.clone();
            debug!("Target {}: Processing {}: {}", address, level.name().to_lowercase(), link.path);
            if !self.filter.accepts(level, &link) {
                debug!("Target {}: Skipping {} URL: {}", address, level.name().to_lowercase(), link.path);
                continue;
            }

            let resource = match client.fetch(&link.path, AuthOverride::Session).await {
                FetchOutcome::Object(resource) => resource,
                FetchOutcome::Status(code) => {
                    debug!("Target {}: No response from {} endpoint {}: HTTP {}", address, level.name(), link.path, code);
                    continue;
                }
                FetchOutcome::Empty => {
                    debug!("Target {}: Empty response from {} endpoint {}", address, level.name(), link.path);
                    continue;
                }
            };

            match level.child() {
                Some((field, child_level)) => match child_collection_path(&resource, field, &link.path) {
                    Some(path) => {
                        debug!("Target {}: Found {} endpoint: {}", address, field, path);
                        self.open_collection(client, &path, child_level).await;
                    }
                    None => debug!("Target {}: {} endpoint does not exist for {}", address, field, link.path),
                },
                None => {
                    if let Some(drive) = read_drive(&address, &link, &resource) {
                        return Some(drive);
                    }
                }
            }
        }
    }

    /// Fetch a collection and queue its members. A missing `Members` field
    /// or a failed fetch ends the branch.
    async fn open_collection(&mut self, client: &mut RedfishClient, path: &str, level: Level) {
        let collection = client.fetch(path, AuthOverride::Session).await;
        let Some(members) = collection.as_object().and_then(collection_members) else {
            debug!("Target {}: No members found in {}", client.target().address, path);
            return;
        };

        debug!("Target {}: {} members in {}", client.target().address, members.len(), path);
        self.stack.push(Frame { level, members });
    }
}

/// Links from a collection's `Members` array, in source order.
pub fn collection_members(collection: &Map<String, Value>) -> Option<VecDeque<ResourceLink>> {
    let members = collection.get("Members")?.as_array()?;
    Some(
        members
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|member| {
                member.iter().filter_map(|(relation, value)| {
                    value.as_str().map(|path| ResourceLink {
                        relation: relation.clone(),
                        path: path.to_string(),
                    })
                })
            })
            .collect(),
    )
}

/// Path of the child collection named `field`. A navigation link is used
/// as-is; inline data (e.g. a `CapacitySources` array) means the collection
/// lives at `<resource>/<field>`.
fn child_collection_path(resource: &Map<String, Value>, field: &str, fallback_path: &str) -> Option<String> {
    let child = resource.get(field)?;
    if let Some(link) = child.get("@odata.id").and_then(Value::as_str) {
        return Some(link.to_string());
    }

    let base = resource
        .get("@odata.id")
        .and_then(Value::as_str)
        .unwrap_or(fallback_path)
        .trim_end_matches('/');
    Some(format!("{}/{}", base, field))
}

fn read_drive(address: &str, link: &ResourceLink, resource: &Map<String, Value>) -> Option<DriveRecord> {
    if !resource.contains_key("@odata.id") {
        debug!("Target {}: Invalid drive data received from: {}", address, link.path);
        return None;
    }

    let drive = DriveRecord::from_resource(&link.path, resource);
    debug!("Target {}: Processing drive with media type: {}", address, drive.media_type.label());
    match drive.media_type {
        MediaType::Nvme | MediaType::Sas => Some(drive),
        MediaType::Other(ref other) => {
            debug!("Target {}: Unsupported media type: {}", address, other);
            None
        }
    }
}
