use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const PENDING: &str = "ChoDuyet";
pub const APPROVED: &str = "DaDuyet";

/// Bespoke per-record routes beyond CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `PATCH {route}/{id}/trang-thai`
    UpdateStatus,
    /// `PUT {route}/{id}/duyet`
    Approve,
    /// `PUT {route}/{id}/thanh-toan`
    ConfirmPayment,
}

#[derive(Debug)]
pub struct CollectionDef {
    pub name: &'static str,
    pub route: &'static str,
    pub required: &'static [&'static str],
    /// Field that must be unique (case-insensitive) across the collection.
    pub unique: Option<(&'static str, &'static str)>,
    /// Field compared against `tuNgay` / `denNgay` in searches.
    pub date_field: Option<&'static str>,
    pub initial_status: Option<&'static str>,
    pub verbs: &'static [Verb],
}

pub const COLLECTIONS: &[CollectionDef] = &[
    CollectionDef {
        name: "patients",
        route: "/benh-nhan",
        required: &["firstName", "lastName"],
        unique: None,
        date_field: None,
        initial_status: None,
        verbs: &[],
    },
    CollectionDef {
        name: "appointments",
        route: "/pdk-kham",
        required: &["BenhNhan", "NgayKham"],
        unique: None,
        date_field: Some("NgayKham"),
        initial_status: Some("ChoKham"),
        verbs: &[Verb::UpdateStatus],
    },
    CollectionDef {
        name: "staff",
        route: "/users",
        required: &["firstName", "lastName"],
        unique: Some(("email", "Email exists")),
        date_field: None,
        initial_status: None,
        verbs: &[],
    },
    CollectionDef {
        name: "departments",
        route: "/khoa",
        required: &["TenKhoa"],
        unique: Some(("TenKhoa", "Department exists")),
        date_field: None,
        initial_status: None,
        verbs: &[],
    },
    CollectionDef {
        name: "prescriptions",
        route: "/don-thuoc",
        required: &["BenhNhan", "ChiTiet"],
        unique: None,
        date_field: None,
        initial_status: None,
        verbs: &[Verb::ConfirmPayment],
    },
    CollectionDef {
        name: "transfer_requests",
        route: "/chuyen-vien/yeu-cau",
        required: &["BenhNhan", "NoiChuyenDen", "LyDo"],
        unique: None,
        date_field: None,
        initial_status: Some(PENDING),
        verbs: &[Verb::Approve],
    },
    CollectionDef {
        name: "transfer_records",
        route: "/chuyen-vien/phieu",
        required: &["YeuCau", "NgayChuyen", "ChanDoan"],
        unique: None,
        date_field: Some("NgayChuyen"),
        initial_status: None,
        verbs: &[],
    },
    CollectionDef {
        name: "schedules",
        route: "/lich-lam-viec",
        required: &["NhanVien", "NgayLamViec", "CaLamViec"],
        unique: None,
        date_field: Some("NgayLamViec"),
        initial_status: None,
        verbs: &[],
    },
    CollectionDef {
        name: "shift_changes",
        route: "/lich-lam-viec/doi-ca",
        required: &["LichLamViec", "CaMoi", "LyDo"],
        unique: None,
        date_field: None,
        initial_status: Some(PENDING),
        verbs: &[Verb::Approve],
    },
    CollectionDef {
        name: "leave_requests",
        route: "/lich-lam-viec/nghi-phep",
        required: &["NhanVien", "TuNgay", "DenNgay", "LyDo"],
        unique: None,
        date_field: Some("TuNgay"),
        initial_status: Some(PENDING),
        verbs: &[Verb::Approve],
    },
];

/// Records per collection name, in insertion order.
pub type Db = Arc<RwLock<HashMap<&'static str, Vec<Value>>>>;

#[derive(Clone)]
struct Collection {
    def: &'static CollectionDef,
    db: Db,
}

/// Error body in the backend's shape: `{ "success": false, "message": ... }`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(def: &CollectionDef, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{} {id} not found", def.name))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(
        COLLECTIONS.iter().map(|def| (def.name, Vec::new())).collect(),
    ));
    let router = Router::new()
        .route("/api/dashboard/stats", get(dashboard_stats))
        .with_state(db.clone());
    COLLECTIONS
        .iter()
        .fold(router, |router, def| router.merge(collection_routes(def, db.clone())))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn collection_routes(def: &'static CollectionDef, db: Db) -> Router {
    let base = format!("/api{}", def.route);
    let mut router = Router::new()
        .route(&base, get(list_records).post(create_record))
        .route(&format!("{base}/search"), get(search_records))
        .route(
            &format!("{base}/{{id}}"),
            get(get_record).put(update_record).delete(delete_record),
        );
    for verb in def.verbs {
        router = match verb {
            Verb::UpdateStatus => router.route(&format!("{base}/{{id}}/trang-thai"), patch(update_status)),
            Verb::Approve => router.route(&format!("{base}/{{id}}/duyet"), put(approve)),
            Verb::ConfirmPayment => router.route(&format!("{base}/{{id}}/thanh-toan"), put(confirm_payment)),
        };
    }
    router.with_state(Collection { def, db })
}

async fn list_records(State(c): State<Collection>) -> Json<Value> {
    let db = c.db.read().await;
    ok(Value::Array(records(&db, c.def).to_vec()))
}

async fn search_records(
    State(c): State<Collection>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let db = c.db.read().await;
    let hits = records(&db, c.def)
        .iter()
        .filter(|record| matches(c.def, record, &params))
        .cloned()
        .collect();
    ok(Value::Array(hits))
}

async fn get_record(
    State(c): State<Collection>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let db = c.db.read().await;
    find(records(&db, c.def), &id)
        .cloned()
        .map(ok)
        .ok_or_else(|| Failure::not_found(c.def, &id))
}

async fn create_record(
    State(c): State<Collection>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let Value::Object(mut fields) = body else {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Body must be a JSON object"));
    };
    for field in c.def.required {
        if is_blank(fields.get(*field)) {
            return Err(Failure::new(
                StatusCode::BAD_REQUEST,
                format!("Missing required field: {field}"),
            ));
        }
    }

    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    check_unique(c.def, records, &fields, None)?;

    let id = Uuid::new_v4().to_string();
    fields.insert("_id".to_string(), Value::String(id.clone()));
    if let Some(status) = c.def.initial_status {
        fields
            .entry("TrangThai")
            .or_insert_with(|| Value::String(status.to_string()));
    }
    if c.def.verbs.contains(&Verb::ConfirmPayment) {
        fields.entry("DaThanhToan").or_insert(Value::Bool(false));
    }
    let record = Value::Object(fields);
    records.push(record.clone());
    tracing::info!(collection = c.def.name, %id, "record created");
    Ok((StatusCode::CREATED, ok(record)))
}

async fn update_record(
    State(c): State<Collection>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Failure> {
    let Value::Object(fields) = body else {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Body must be a JSON object"));
    };
    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    check_unique(c.def, records, &fields, Some(id.as_str()))?;
    let record = find_mut(records, &id).ok_or_else(|| Failure::not_found(c.def, &id))?;
    merge(record, fields);
    Ok(ok(record.clone()))
}

async fn delete_record(
    State(c): State<Collection>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    let before = records.len();
    records.retain(|record| record_id(record) != Some(id.as_str()));
    if records.len() == before {
        return Err(Failure::not_found(c.def, &id));
    }
    Ok(Json(json!({ "success": true, "message": "Deleted" })))
}

async fn update_status(
    State(c): State<Collection>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Failure> {
    let status = body
        .get("TrangThai")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Missing required field: TrangThai"))?
        .to_string();
    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    let record = find_mut(records, &id).ok_or_else(|| Failure::not_found(c.def, &id))?;
    record["TrangThai"] = Value::String(status);
    Ok(ok(record.clone()))
}

async fn approve(
    State(c): State<Collection>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Failure> {
    let decision = body
        .get("TrangThai")
        .and_then(Value::as_str)
        .unwrap_or(APPROVED)
        .to_string();
    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    let record = find_mut(records, &id).ok_or_else(|| Failure::not_found(c.def, &id))?;
    if record.get("TrangThai").and_then(Value::as_str) != Some(PENDING) {
        return Err(Failure::new(StatusCode::CONFLICT, "Request already processed"));
    }
    record["TrangThai"] = Value::String(decision);
    if let Some(note) = body.get("GhiChu") {
        record["GhiChu"] = note.clone();
    }
    Ok(ok(record.clone()))
}

async fn confirm_payment(
    State(c): State<Collection>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let mut db = c.db.write().await;
    let records = db.entry(c.def.name).or_default();
    let record = find_mut(records, &id).ok_or_else(|| Failure::not_found(c.def, &id))?;
    if record.get("DaThanhToan").and_then(Value::as_bool) == Some(true) {
        return Err(Failure::new(StatusCode::CONFLICT, "Prescription already paid"));
    }
    record["DaThanhToan"] = Value::Bool(true);
    Ok(ok(record.clone()))
}

async fn dashboard_stats(State(db): State<Db>) -> Json<Value> {
    let db = db.read().await;
    let count = |name: &str| db.get(name).map_or(0, Vec::len);
    let pending_transfers = db
        .get("transfer_requests")
        .map_or(0, |records| {
            records
                .iter()
                .filter(|r| r.get("TrangThai").and_then(Value::as_str) == Some(PENDING))
                .count()
        });
    ok(json!({
        "patients": count("patients"),
        "appointments": count("appointments"),
        "staff": count("staff"),
        "prescriptions": count("prescriptions"),
        "pendingTransfers": pending_transfers,
    }))
}

fn records<'a>(db: &'a HashMap<&'static str, Vec<Value>>, def: &CollectionDef) -> &'a [Value] {
    db.get(def.name).map(Vec::as_slice).unwrap_or_default()
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("_id").and_then(Value::as_str)
}

fn find<'a>(records: &'a [Value], id: &str) -> Option<&'a Value> {
    records.iter().find(|record| record_id(record) == Some(id))
}

fn find_mut<'a>(records: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    records.iter_mut().find(|record| record_id(record) == Some(id))
}

fn merge(record: &mut Value, fields: Map<String, Value>) {
    if let Value::Object(existing) = record {
        for (key, value) in fields {
            if key != "_id" {
                existing.insert(key, value);
            }
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn check_unique(
    def: &CollectionDef,
    records: &[Value],
    fields: &Map<String, Value>,
    except_id: Option<&str>,
) -> Result<(), Failure> {
    let Some((field, message)) = def.unique else {
        return Ok(());
    };
    let Some(candidate) = fields.get(field).and_then(Value::as_str) else {
        return Ok(());
    };
    let taken = records.iter().any(|record| {
        record_id(record) != except_id
            && record
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|existing| existing.eq_ignore_ascii_case(candidate))
    });
    if taken {
        return Err(Failure::new(StatusCode::CONFLICT, message));
    }
    Ok(())
}

/// `q` is a case-insensitive substring over string fields, `tuNgay` and
/// `denNgay` bound the collection's date field, any other key must equal the
/// field of the same name.
fn matches(def: &CollectionDef, record: &Value, params: &HashMap<String, String>) -> bool {
    params.iter().all(|(key, value)| match key.as_str() {
        "q" => text_matches(record, value),
        "tuNgay" => day_of(def, record).is_some_and(|day| day >= value.as_str()),
        "denNgay" => day_of(def, record).is_some_and(|day| day <= value.as_str()),
        _ => record.get(key).is_some_and(|field| field_equals(field, value)),
    })
}

/// Fields that free-text search never looks at.
const UNSEARCHABLE: &[&str] = &["_id", "TrangThai"];

fn text_matches(record: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.as_object().is_some_and(|fields| {
        fields
            .iter()
            .filter(|(key, _)| !UNSEARCHABLE.contains(&key.as_str()))
            .filter_map(|(_, value)| value.as_str())
            .any(|text| text.to_lowercase().contains(&needle))
    })
}

fn day_of<'a>(def: &CollectionDef, record: &'a Value) -> Option<&'a str> {
    let raw = record.get(def.date_field?)?.as_str()?;
    Some(raw.get(..10).unwrap_or(raw))
}

fn field_equals(field: &Value, expected: &str) -> bool {
    match field {
        Value::String(s) => s == expected,
        Value::Object(obj) => obj.get("_id").and_then(Value::as_str) == Some(expected),
        other => other.to_string() == expected,
    }
}
