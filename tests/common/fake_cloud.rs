//! In-process stand-in for the target cloud.
//!
//! One wiremock server per service (identity, compute, volume), all backed
//! by a single shared state so cross-service flows work: a token issued by
//! the identity mock is honored by the compute and volume mocks, and a
//! volume created through the volume mock is visible to later show calls.
//!
//! Created resources do not become ready instantly. Each starts in its
//! provisioning status (`creating` / `BUILD`) and turns ready only after a
//! configurable number of show calls, so status wait loops are exercised
//! against real transitions. Deletions likewise answer `deleting` once
//! before the resource disappears.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use stratus::config::{
    AdminCredentials, ComputeConfig, IdentityConfig, TestConfig, VolumeConfig,
};

const PRIMARY_USER: &str = "demo";
const PRIMARY_PASSWORD: &str = "secret";
const PRIMARY_TENANT: &str = "demo-project";
const ADMIN_USER: &str = "root";
const ADMIN_PASSWORD: &str = "rootpw";
const ADMIN_TENANT: &str = "admin-project";

#[derive(Debug, Clone)]
struct TokenScope {
    admin: bool,
}

#[derive(Debug, Clone)]
struct UserAccount {
    id: String,
    name: String,
    password: String,
    tenant_id: String,
    admin: bool,
}

#[derive(Debug, Clone)]
struct TenantRecord {
    id: String,
    name: String,
}

#[derive(Debug, Clone)]
struct HostRecord {
    name: String,
    service: String,
    zone: String,
}

#[derive(Debug)]
struct VolumeRecord {
    status: String,
    polls_left: u32,
    size: i64,
    display_name: Option<String>,
    metadata: Value,
}

#[derive(Debug)]
struct SnapshotRecord {
    status: String,
    polls_left: u32,
    volume_id: String,
    display_name: Option<String>,
}

#[derive(Debug)]
struct ServerRecord {
    status: String,
    polls_left: u32,
    name: String,
}

#[derive(Debug)]
struct CloudState {
    tokens: HashMap<String, TokenScope>,
    users: Vec<UserAccount>,
    tenants: Vec<TenantRecord>,
    hosts: Vec<HostRecord>,
    volumes: HashMap<String, VolumeRecord>,
    snapshots: HashMap<String, SnapshotRecord>,
    servers: HashMap<String, ServerRecord>,
    /// Show calls a fresh resource answers with its provisioning status
    /// before turning ready.
    provision_polls: u32,
    seq: u64,
}

impl CloudState {
    fn seeded() -> Self {
        Self {
            tokens: HashMap::new(),
            users: vec![
                UserAccount {
                    id: "user-demo".into(),
                    name: PRIMARY_USER.into(),
                    password: PRIMARY_PASSWORD.into(),
                    tenant_id: "seed-demo".into(),
                    admin: false,
                },
                UserAccount {
                    id: "user-root".into(),
                    name: ADMIN_USER.into(),
                    password: ADMIN_PASSWORD.into(),
                    tenant_id: "seed-admin".into(),
                    admin: true,
                },
            ],
            tenants: vec![
                TenantRecord { id: "seed-demo".into(), name: PRIMARY_TENANT.into() },
                TenantRecord { id: "seed-admin".into(), name: ADMIN_TENANT.into() },
            ],
            hosts: vec![
                HostRecord {
                    name: "compute-01".into(),
                    service: "compute".into(),
                    zone: "nova".into(),
                },
                HostRecord {
                    name: "compute-02".into(),
                    service: "compute".into(),
                    zone: "nova-alt".into(),
                },
                HostRecord {
                    name: "netnode-01".into(),
                    service: "network".into(),
                    zone: "internal".into(),
                },
            ],
            volumes: HashMap::new(),
            snapshots: HashMap::new(),
            servers: HashMap::new(),
            provision_polls: 1,
            seq: 0,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{:04}", self.seq)
    }

    fn token_scope(&self, req: &Request) -> Option<TokenScope> {
        let token = req.headers.get("x-auth-token")?.to_str().ok()?;
        self.tokens.get(token).cloned()
    }
}

/// Step a resource's status machine on one show call. Returns `true` when
/// the resource should disappear (deletion completed).
fn tick(status: &mut String, polls_left: &mut u32, ready: &str) -> bool {
    match status.as_str() {
        "creating" | "BUILD" => {
            if *polls_left > 0 {
                *polls_left -= 1;
            } else {
                *status = ready.to_string();
            }
            false
        }
        "deleting" => {
            if *polls_left > 0 {
                *polls_left -= 1;
                false
            } else {
                true
            }
        }
        _ => false,
    }
}

fn not_found(what: &str) -> ResponseTemplate {
    ResponseTemplate::new(404)
        .set_body_json(json!({"itemNotFound": {"code": 404, "message": format!("{what} could not be found")}}))
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401)
        .set_body_json(json!({"unauthorized": {"code": 401, "message": "Authentication required"}}))
}

fn forbidden() -> ResponseTemplate {
    ResponseTemplate::new(403)
        .set_body_json(json!({"forbidden": {"code": 403, "message": "Policy doesn't allow this to be performed"}}))
}

fn bad_request(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400)
        .set_body_json(json!({"badRequest": {"code": 400, "message": message}}))
}

fn volume_body(id: &str, rec: &VolumeRecord) -> Value {
    json!({
        "volume": {
            "id": id,
            "status": rec.status,
            "size": rec.size,
            "display_name": rec.display_name,
            "metadata": rec.metadata,
        }
    })
}

fn snapshot_body(id: &str, rec: &SnapshotRecord) -> Value {
    json!({
        "snapshot": {
            "id": id,
            "volume_id": rec.volume_id,
            "status": rec.status,
            "display_name": rec.display_name,
        }
    })
}

fn server_body(id: &str, rec: &ServerRecord) -> Value {
    json!({"server": {"id": id, "name": rec.name, "status": rec.status}})
}

fn identity_respond(state: &Mutex<CloudState>, req: &Request) -> ResponseTemplate {
    let mut state = state.lock().unwrap();
    let path = req.url.path().trim_start_matches("/v2.0");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("POST", ["tokens"]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let creds = &body["auth"]["passwordCredentials"];
            let username = creds["username"].as_str().unwrap_or_default();
            let password = creds["password"].as_str().unwrap_or_default();
            let tenant_name = body["auth"]["tenantName"].as_str().unwrap_or_default();

            let Some(user) = state
                .users
                .iter()
                .find(|u| u.name == username && u.password == password)
                .cloned()
            else {
                return unauthorized();
            };
            let Some(tenant) = state
                .tenants
                .iter()
                .find(|t| t.id == user.tenant_id && t.name == tenant_name)
                .cloned()
            else {
                return unauthorized();
            };

            let token_id = state.next_id("tok");
            state.tokens.insert(token_id.clone(), TokenScope { admin: user.admin });
            ResponseTemplate::new(200).set_body_json(json!({
                "access": {
                    "token": {
                        "id": token_id,
                        "tenant": {"id": tenant.id, "name": tenant.name},
                    }
                }
            }))
        }
        ("POST", ["tenants"]) => {
            if !state.token_scope(req).is_some_and(|s| s.admin) {
                return forbidden();
            }
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let name = body["tenant"]["name"].as_str().unwrap_or_default().to_string();
            let id = state.next_id("tenant");
            state.tenants.push(TenantRecord { id: id.clone(), name: name.clone() });
            ResponseTemplate::new(200).set_body_json(json!({"tenant": {"id": id, "name": name}}))
        }
        ("POST", ["users"]) => {
            if !state.token_scope(req).is_some_and(|s| s.admin) {
                return forbidden();
            }
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let name = body["user"]["name"].as_str().unwrap_or_default().to_string();
            let password = body["user"]["password"].as_str().unwrap_or_default().to_string();
            let tenant_id = body["user"]["tenantId"].as_str().unwrap_or_default().to_string();
            if !state.tenants.iter().any(|t| t.id == tenant_id) {
                return not_found("Tenant");
            }
            let id = state.next_id("user");
            state.users.push(UserAccount {
                id: id.clone(),
                name: name.clone(),
                password,
                tenant_id,
                admin: false,
            });
            ResponseTemplate::new(200).set_body_json(json!({"user": {"id": id, "name": name}}))
        }
        ("PUT", ["tenants", tenant_id, "users", user_id, "roles", role]) => {
            if !state.token_scope(req).is_some_and(|s| s.admin) {
                return forbidden();
            }
            if !state.tenants.iter().any(|t| &t.id == tenant_id) {
                return not_found("Tenant");
            }
            let grant_admin = *role == "admin";
            match state.users.iter_mut().find(|u| &u.id == user_id) {
                Some(user) => {
                    if grant_admin {
                        user.admin = true;
                    }
                    ResponseTemplate::new(200).set_body_json(json!({}))
                }
                None => not_found("User"),
            }
        }
        ("DELETE", ["users", user_id]) => {
            if !state.token_scope(req).is_some_and(|s| s.admin) {
                return forbidden();
            }
            let before = state.users.len();
            state.users.retain(|u| &u.id != user_id);
            if state.users.len() == before {
                not_found("User")
            } else {
                ResponseTemplate::new(204)
            }
        }
        ("DELETE", ["tenants", tenant_id]) => {
            if !state.token_scope(req).is_some_and(|s| s.admin) {
                return forbidden();
            }
            let before = state.tenants.len();
            state.tenants.retain(|t| &t.id != tenant_id);
            if state.tenants.len() == before {
                not_found("Tenant")
            } else {
                ResponseTemplate::new(204)
            }
        }
        _ => not_found("Resource"),
    }
}

fn compute_respond(state: &Mutex<CloudState>, req: &Request) -> ResponseTemplate {
    let mut state = state.lock().unwrap();
    let Some(scope) = state.token_scope(req) else {
        return unauthorized();
    };
    let path = req.url.path().trim_start_matches("/v2");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("GET", ["os-hosts"]) => {
            if !scope.admin {
                return forbidden();
            }
            let zone: Option<String> = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "zone")
                .map(|(_, v)| v.into_owned());
            let hosts: Vec<Value> = state
                .hosts
                .iter()
                .filter(|h| match zone.as_deref() {
                    // Blank zone filter means no filter at all.
                    Some(z) if !z.is_empty() => h.zone == z,
                    _ => true,
                })
                .map(|h| {
                    json!({"host_name": h.name, "service": h.service, "zone": h.zone})
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({"hosts": hosts}))
        }
        ("GET", ["os-hosts", host_name]) => {
            if !scope.admin {
                return forbidden();
            }
            let Some(host) = state.hosts.iter().find(|h| &h.name == host_name) else {
                return not_found("Host");
            };
            let entries: Vec<Value> = ["(total)", "(used_now)", "(used_max)"]
                .iter()
                .map(|project| {
                    json!({
                        "resource": {
                            "host": host.name,
                            "project": project,
                            "cpu": 16,
                            "disk_gb": 1024,
                            "memory_mb": 32768,
                        }
                    })
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({"host": entries}))
        }
        ("GET", ["networks"]) => ResponseTemplate::new(200).set_body_json(json!({
            "networks": [{"id": "net-private", "name": "private"}]
        })),
        ("POST", ["servers"]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let name = body["server"]["name"].as_str().unwrap_or_default().to_string();
            if name.is_empty() {
                return bad_request("Server name is not defined");
            }
            let id = state.next_id("srv");
            let polls = state.provision_polls;
            let rec = ServerRecord { status: "BUILD".into(), polls_left: polls, name };
            let body = server_body(&id, &rec);
            state.servers.insert(id, rec);
            ResponseTemplate::new(202).set_body_json(body)
        }
        ("GET", ["servers", server_id]) => {
            let id = server_id.to_string();
            let gone = match state.servers.get_mut(&id) {
                Some(rec) => tick(&mut rec.status, &mut rec.polls_left, "ACTIVE"),
                None => return not_found("Server"),
            };
            if gone {
                state.servers.remove(&id);
                not_found("Server")
            } else {
                let rec = &state.servers[&id];
                ResponseTemplate::new(200).set_body_json(server_body(&id, rec))
            }
        }
        ("DELETE", ["servers", server_id]) => {
            match state.servers.get_mut(*server_id) {
                Some(rec) => {
                    rec.status = "deleting".into();
                    rec.polls_left = 1;
                    ResponseTemplate::new(204)
                }
                None => not_found("Server"),
            }
        }
        _ => not_found("Resource"),
    }
}

fn volume_respond(state: &Mutex<CloudState>, req: &Request) -> ResponseTemplate {
    let mut state = state.lock().unwrap();
    if state.token_scope(req).is_none() {
        return unauthorized();
    }
    let path = req.url.path().trim_start_matches("/v1");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("POST", ["volumes"]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let size = body["volume"]["size"].as_i64().unwrap_or(0);
            if size <= 0 {
                return bad_request("Volume size must be a positive integer");
            }
            let display_name =
                body["volume"]["display_name"].as_str().map(|s| s.to_string());
            let metadata = body["volume"]["metadata"].clone();
            let metadata = if metadata.is_object() { metadata } else { json!({}) };
            let id = state.next_id("vol");
            let polls = state.provision_polls;
            let rec = VolumeRecord {
                status: "creating".into(),
                polls_left: polls,
                size,
                display_name,
                metadata,
            };
            let body = volume_body(&id, &rec);
            state.volumes.insert(id, rec);
            ResponseTemplate::new(200).set_body_json(body)
        }
        ("GET", ["volumes", volume_id]) => {
            let id = volume_id.to_string();
            let gone = match state.volumes.get_mut(&id) {
                Some(rec) => tick(&mut rec.status, &mut rec.polls_left, "available"),
                None => return not_found("Volume"),
            };
            if gone {
                state.volumes.remove(&id);
                not_found("Volume")
            } else {
                let rec = &state.volumes[&id];
                ResponseTemplate::new(200).set_body_json(volume_body(&id, rec))
            }
        }
        ("PUT", ["volumes", volume_id]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let display_name =
                body["volume"]["display_name"].as_str().map(|s| s.to_string());
            let id = volume_id.to_string();
            match state.volumes.get_mut(&id) {
                Some(rec) => {
                    rec.display_name = display_name;
                    let rec = &state.volumes[&id];
                    ResponseTemplate::new(200).set_body_json(volume_body(&id, rec))
                }
                None => not_found("Volume"),
            }
        }
        ("DELETE", ["volumes", volume_id]) => {
            match state.volumes.get_mut(*volume_id) {
                Some(rec) => {
                    rec.status = "deleting".into();
                    rec.polls_left = 1;
                    ResponseTemplate::new(202)
                }
                None => not_found("Volume"),
            }
        }
        ("POST", ["volumes", volume_id, "action"]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let id = volume_id.to_string();
            match state.volumes.get_mut(&id) {
                Some(rec) => {
                    if body.get("os-attach").is_some() {
                        rec.status = "in-use".into();
                    } else if body.get("os-detach").is_some() {
                        rec.status = "available".into();
                    } else {
                        return bad_request("Unknown volume action");
                    }
                    ResponseTemplate::new(202)
                }
                None => not_found("Volume"),
            }
        }
        ("POST", ["snapshots"]) => {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let volume_id =
                body["snapshot"]["volume_id"].as_str().unwrap_or_default().to_string();
            if !state.volumes.contains_key(&volume_id) {
                return not_found("Volume");
            }
            let display_name =
                body["snapshot"]["display_name"].as_str().map(|s| s.to_string());
            let id = state.next_id("snap");
            let polls = state.provision_polls;
            let rec = SnapshotRecord {
                status: "creating".into(),
                polls_left: polls,
                volume_id,
                display_name,
            };
            let body = snapshot_body(&id, &rec);
            state.snapshots.insert(id, rec);
            ResponseTemplate::new(200).set_body_json(body)
        }
        ("GET", ["snapshots", snapshot_id]) => {
            let id = snapshot_id.to_string();
            let gone = match state.snapshots.get_mut(&id) {
                Some(rec) => tick(&mut rec.status, &mut rec.polls_left, "available"),
                None => return not_found("Snapshot"),
            };
            if gone {
                state.snapshots.remove(&id);
                not_found("Snapshot")
            } else {
                let rec = &state.snapshots[&id];
                ResponseTemplate::new(200).set_body_json(snapshot_body(&id, rec))
            }
        }
        ("DELETE", ["snapshots", snapshot_id]) => {
            match state.snapshots.get_mut(*snapshot_id) {
                Some(rec) => {
                    rec.status = "deleting".into();
                    rec.polls_left = 1;
                    ResponseTemplate::new(202)
                }
                None => not_found("Snapshot"),
            }
        }
        _ => not_found("Resource"),
    }
}

/// The fake cloud: three mock servers plus handles into the shared state
/// for seeding and assertions.
pub struct FakeCloud {
    pub identity: MockServer,
    pub compute: MockServer,
    pub volume: MockServer,
    state: Arc<Mutex<CloudState>>,
}

impl FakeCloud {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(CloudState::seeded()));

        let identity = MockServer::start().await;
        let identity_state = state.clone();
        Mock::given(any())
            .respond_with(move |req: &Request| identity_respond(&identity_state, req))
            .mount(&identity)
            .await;

        let compute = MockServer::start().await;
        let compute_state = state.clone();
        Mock::given(any())
            .respond_with(move |req: &Request| compute_respond(&compute_state, req))
            .mount(&compute)
            .await;

        let volume = MockServer::start().await;
        let volume_state = state.clone();
        Mock::given(any())
            .respond_with(move |req: &Request| volume_respond(&volume_state, req))
            .mount(&volume)
            .await;

        Self { identity, compute, volume, state }
    }

    /// Harness configuration pointing at this fake cloud, with static
    /// credentials for both roles and short wait tuning.
    pub fn config(&self) -> TestConfig {
        TestConfig {
            identity: IdentityConfig {
                auth_url: format!("{}/v2.0/", self.identity.uri()),
                username: PRIMARY_USER.into(),
                password: PRIMARY_PASSWORD.into(),
                tenant_name: PRIMARY_TENANT.into(),
                admin: Some(AdminCredentials {
                    username: ADMIN_USER.into(),
                    password: ADMIN_PASSWORD.into(),
                    tenant_name: ADMIN_TENANT.into(),
                }),
                allow_tenant_isolation: false,
            },
            compute: ComputeConfig {
                endpoint: format!("{}/v2/", self.compute.uri()),
                build_interval_seconds: 1,
                build_timeout_seconds: 10,
                image_ref: "img-cirros".into(),
                flavor_ref: "1".into(),
                fixed_network_name: Some("private".into()),
            },
            volume: VolumeConfig {
                endpoint: format!("{}/v1/", self.volume.uri()),
                build_interval_seconds: 1,
                build_timeout_seconds: 10,
            },
            ..TestConfig::default()
        }
    }

    /// Like [`config`](Self::config) but minting a fresh tenant and user per
    /// harness.
    pub fn config_isolated(&self) -> TestConfig {
        let mut config = self.config();
        config.identity.allow_tenant_isolation = true;
        config
    }

    /// Show calls a fresh resource spends in its provisioning status before
    /// turning ready. Large values make resources effectively never ready.
    pub fn set_provision_polls(&self, polls: u32) {
        self.state.lock().unwrap().provision_polls = polls;
    }

    pub fn volume_count(&self) -> usize {
        self.state.lock().unwrap().volumes.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.state.lock().unwrap().snapshots.len()
    }

    pub fn server_count(&self) -> usize {
        self.state.lock().unwrap().servers.len()
    }

    /// Tenants created on top of the seeded ones, i.e. by tenant isolation.
    pub fn minted_tenant_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tenants
            .iter()
            .filter(|t| !t.id.starts_with("seed-"))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Users created on top of the seeded ones.
    pub fn minted_user_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.id != "user-demo" && u.id != "user-root")
            .count()
    }
}
