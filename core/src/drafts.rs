//! Form drafts: the editable fields of one record, checked before submit.
//!
//! Checks stop at required fields and simple numeric ranges. Anything deeper
//! (duplicate emails, overlapping shifts) is the backend's call.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::types::status;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, max = 15, message = "phone number must be 8 to 15 digits"))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffMember {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAppointment {
    #[serde(rename = "BenhNhan")]
    #[validate(length(min = 1, message = "patient is required"))]
    pub patient: String,
    #[serde(rename = "BacSi", default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(rename = "Khoa", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(rename = "NgayKham")]
    #[validate(length(min = 1, message = "appointment date is required"))]
    pub date: String,
    #[serde(rename = "LyDoKham", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppointmentStatusUpdate {
    #[serde(rename = "TrangThai")]
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

/// One line of a prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PrescriptionItem {
    #[serde(rename = "TenThuoc", default)]
    #[validate(length(min = 1, message = "medicine is required"))]
    pub medicine: String,
    #[serde(rename = "LieuDung", default)]
    #[validate(length(min = 1, message = "dosage is required"))]
    pub dosage: String,
    #[serde(rename = "SoLuong", default, deserialize_with = "lenient_count")]
    #[validate(range(min = 1, max = 1000, message = "quantity must be between 1 and 1000"))]
    pub quantity: u32,
    #[serde(rename = "SoLanMoiNgay", default, deserialize_with = "lenient_count")]
    #[validate(range(min = 1, max = 10, message = "doses per day must be between 1 and 10"))]
    pub times_per_day: u32,
    #[serde(rename = "SoNgay", default, deserialize_with = "lenient_count")]
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewPrescription {
    #[serde(rename = "BenhNhan")]
    #[validate(length(min = 1, message = "patient is required"))]
    pub patient: String,
    #[serde(rename = "BacSi", default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(rename = "ChiTiet")]
    #[validate(custom = "validate_items")]
    pub items: Vec<PrescriptionItem>,
    #[serde(rename = "GhiChu", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Counts that are not a whole number in `u32` range read as zero, which the
/// range checks then reject.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

fn validate_items(items: &[PrescriptionItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new("at_least_one_item"));
    }
    if items.iter().any(|item| item.validate().is_err()) {
        return Err(ValidationError::new("invalid_item"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTransferRequest {
    #[serde(rename = "BenhNhan")]
    #[validate(length(min = 1, message = "patient is required"))]
    pub patient: String,
    #[serde(rename = "NoiChuyenDen")]
    #[validate(length(min = 1, message = "destination is required"))]
    pub destination: String,
    #[serde(rename = "LyDo")]
    #[validate(length(min = 1, message = "reason is required"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTransferRecord {
    #[serde(rename = "YeuCau")]
    #[validate(length(min = 1, message = "transfer request is required"))]
    pub request: String,
    #[serde(rename = "NgayChuyen")]
    #[validate(length(min = 1, message = "transfer date is required"))]
    pub transfer_date: String,
    #[serde(rename = "ChanDoan")]
    #[validate(length(min = 1, message = "diagnosis is required"))]
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewWorkSchedule {
    #[serde(rename = "NhanVien")]
    #[validate(length(min = 1, message = "staff member is required"))]
    pub staff: String,
    #[serde(rename = "NgayLamViec")]
    pub work_date: NaiveDate,
    #[serde(rename = "CaLamViec")]
    #[validate(length(min = 1, message = "shift is required"))]
    pub shift: String,
    #[serde(rename = "Khoa", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewShiftChangeRequest {
    #[serde(rename = "LichLamViec")]
    #[validate(length(min = 1, message = "schedule is required"))]
    pub schedule: String,
    #[serde(rename = "NgayMoi", default, skip_serializing_if = "Option::is_none")]
    pub requested_date: Option<NaiveDate>,
    #[serde(rename = "CaMoi")]
    #[validate(length(min = 1, message = "requested shift is required"))]
    pub requested_shift: String,
    #[serde(rename = "LyDo")]
    #[validate(length(min = 1, message = "reason is required"))]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_leave_range"))]
pub struct NewLeaveRequest {
    #[serde(rename = "NhanVien")]
    #[validate(length(min = 1, message = "staff member is required"))]
    pub staff: String,
    #[serde(rename = "TuNgay")]
    pub from: NaiveDate,
    #[serde(rename = "DenNgay")]
    pub to: NaiveDate,
    #[serde(rename = "LyDo")]
    #[validate(length(min = 1, message = "reason is required"))]
    pub reason: String,
}

fn validate_leave_range(leave: &NewLeaveRequest) -> Result<(), ValidationError> {
    if leave.to < leave.from {
        return Err(ValidationError::new("leave_ends_before_it_starts"));
    }
    Ok(())
}

/// Decision body for the `duyet` verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Approval {
    #[serde(rename = "TrangThai")]
    #[validate(length(min = 1))]
    pub status: String,
    #[serde(rename = "GhiChu", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Approval {
    pub fn approve() -> Self {
        Self {
            status: status::APPROVED.to_string(),
            note: None,
        }
    }

    pub fn reject(note: &str) -> Self {
        Self {
            status: status::REJECTED.to_string(),
            note: Some(note.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32) -> PrescriptionItem {
        PrescriptionItem {
            medicine: "Paracetamol".to_string(),
            dosage: "500mg".to_string(),
            quantity,
            times_per_day: 2,
            days: 5,
        }
    }

    #[test]
    fn patient_requires_names() {
        let draft = NewPatient {
            first_name: "An".to_string(),
            ..Default::default()
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("last_name"));
    }

    #[test]
    fn staff_email_is_optional_but_checked() {
        let mut draft = NewStaffMember {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_ok());

        draft.email = Some("not-an-email".to_string());
        assert!(draft.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn prescription_needs_at_least_one_valid_item() {
        let mut draft = NewPrescription {
            patient: "p1".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        draft.items = vec![item(10)];
        assert!(draft.validate().is_ok());

        draft.items.push(item(0));
        assert!(draft.validate().unwrap_err().field_errors().contains_key("items"));
    }

    #[test]
    fn item_quantity_range() {
        assert!(item(1000).validate().is_ok());
        assert!(item(1001).validate().is_err());
    }

    #[test]
    fn leave_cannot_end_before_it_starts() {
        let leave = NewLeaveRequest {
            staff: "u1".to_string(),
            from: NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            reason: "Việc gia đình".to_string(),
        };
        assert!(leave.validate().is_err());
    }

    #[test]
    fn drafts_serialize_with_backend_names() {
        let draft = NewAppointment {
            patient: "p1".to_string(),
            date: "2024-05-06".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["BenhNhan"], "p1");
        assert_eq!(body["NgayKham"], "2024-05-06");
        assert!(body.get("BacSi").is_none());
    }

    #[test]
    fn approval_statuses() {
        assert_eq!(Approval::approve().status, "DaDuyet");
        let rejected = Approval::reject("Thiếu nhân lực");
        assert_eq!(rejected.status, "TuChoi");
        assert_eq!(rejected.note.as_deref(), Some("Thiếu nhân lực"));
    }
}
