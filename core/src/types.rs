//! Read models for backend records.
//!
//! # Design
//! The backend owns these schemas. Each type names only the fields the client
//! displays or computes with; everything else lands in `extra` and is sent
//! back untouched. References to other records arrive either as a bare id or
//! as a populated object, so they are modelled as `Ref`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Extra = serde_json::Map<String, Value>;

/// Workflow states shared by requests that go through approval.
pub mod status {
    pub const PENDING: &str = "ChoDuyet";
    pub const APPROVED: &str = "DaDuyet";
    pub const REJECTED: &str = "TuChoi";
}

/// A reference to another record: its id, or the record itself when the
/// backend populated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref {
    Id(String),
    Record(Extra),
}

impl Ref {
    pub fn id(&self) -> Option<&str> {
        match self {
            Ref::Id(id) => Some(id),
            Ref::Record(record) => record.get("_id").and_then(Value::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Patient {
    /// Family name first, as printed on Vietnamese records.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Ref>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "TenKhoa", default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "BenhNhan", default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Ref>,
    #[serde(rename = "BacSi", default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Ref>,
    #[serde(rename = "Khoa", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Ref>,
    #[serde(rename = "NgayKham", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "LyDoKham", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "BenhNhan", default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Ref>,
    #[serde(rename = "BacSi", default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Ref>,
    #[serde(rename = "ChiTiet", default)]
    pub items: Vec<crate::drafts::PrescriptionItem>,
    #[serde(rename = "DaThanhToan", default)]
    pub paid: bool,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Prescription {
    /// Units dispensed across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "BenhNhan", default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Ref>,
    #[serde(rename = "NoiChuyenDen", default)]
    pub destination: String,
    #[serde(rename = "LyDo", default)]
    pub reason: String,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "YeuCau", default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Ref>,
    #[serde(rename = "NgayChuyen", default, skip_serializing_if = "Option::is_none")]
    pub transfer_date: Option<String>,
    #[serde(rename = "ChanDoan", default)]
    pub diagnosis: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "NhanVien", default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Ref>,
    #[serde(rename = "CaLamViec", default)]
    pub shift: String,
    #[serde(rename = "Khoa", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Ref>,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WorkSchedule {
    /// The day worked, read from `NgayLamViec`.
    pub fn work_date(&self) -> Option<NaiveDate> {
        flexible_date::field(&self.extra, "NgayLamViec")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftChangeRequest {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "NhanVien", default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Ref>,
    #[serde(rename = "LichLamViec", default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Ref>,
    #[serde(rename = "CaMoi", default)]
    pub requested_shift: String,
    #[serde(rename = "LyDo", default)]
    pub reason: String,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "NhanVien", default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Ref>,
    #[serde(rename = "LyDo", default)]
    pub reason: String,
    #[serde(rename = "TrangThai", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl LeaveRequest {
    pub fn first_day(&self) -> Option<NaiveDate> {
        flexible_date::field(&self.extra, "TuNgay")
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        flexible_date::field(&self.extra, "DenNgay")
    }

    /// Calendar days covered, both ends included. `None` unless both ends
    /// are readable dates.
    pub fn days(&self) -> Option<i64> {
        Some((self.last_day()? - self.first_day()?).num_days() + 1)
    }
}

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub patients: u64,
    pub appointments: u64,
    pub staff: u64,
    pub prescriptions: u64,
    pub pending_transfers: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Dates arrive as `YYYY-MM-DD` or as a full timestamp; only the calendar day
/// is read. Date fields stay in `extra` as sent, so a value that does not
/// parse is still passed back untouched.
mod flexible_date {
    use chrono::NaiveDate;
    use serde_json::Value;

    use super::Extra;

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn field(extra: &Extra, key: &str) -> Option<NaiveDate> {
        extra.get(key).and_then(Value::as_str).and_then(parse)
    }
}
