//! Domain-named resource cells.
//!
//! Each constructor binds one resource-group call and its dependency value to
//! an `ApiQuery` or `ApiMutation`. There is no logic here beyond choosing the
//! route and validating drafts before they are sent.

use std::future::Future;

use validator::Validate;

use crate::api::Api;
use crate::client::SearchParams;
use crate::drafts::{
    Approval, AppointmentStatusUpdate, NewAppointment, NewLeaveRequest, NewPatient,
    NewPrescription, NewShiftChangeRequest, NewStaffMember, NewTransferRecord, NewTransferRequest,
    NewWorkSchedule,
};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::Transport;
use crate::resource::{ApiMutation, ApiQuery};
use crate::schedule::DateRange;
use crate::types::{
    Appointment, DashboardStats, Department, LeaveRequest, Patient, Prescription,
    ShiftChangeRequest, StaffMember, TransferRecord, TransferRequest, WorkSchedule,
};

/// Input of an update mutation: record id plus the edited draft.
pub type Edit<D> = (String, D);

/// Filters for the appointment list; an all-empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub date: Option<String>,
    pub status: Option<String>,
    pub doctor: Option<String>,
}

impl AppointmentFilter {
    pub fn to_params(&self) -> SearchParams {
        SearchParams::new()
            .param_opt("NgayKham", self.date.as_deref())
            .param_opt("TrangThai", self.status.as_deref())
            .param_opt("BacSi", self.doctor.as_deref())
    }
}

fn query<Tr, D, T, F, Fut>(api: &Api<Tr>, deps: D, fetch: F) -> ApiQuery<D, T>
where
    Tr: Transport,
    D: Clone + PartialEq + Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(Api<Tr>, D) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
{
    let api = api.clone();
    ApiQuery::new(deps, move |deps: &D| fetch(api.clone(), deps.clone()))
}

fn mutation<Tr, I, T, F, Fut>(api: &Api<Tr>, call: F) -> ApiMutation<I, T>
where
    Tr: Transport,
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(Api<Tr>, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
{
    let api = api.clone();
    ApiMutation::new(move |input: I| call(api.clone(), input))
}

/// Free-text `q` parameter; empty for a blank term.
fn term_params(term: &str) -> SearchParams {
    SearchParams::new().param("q", term)
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

pub fn use_patients<Tr: Transport>(api: &Api<Tr>, search_term: &str) -> ApiQuery<String, Vec<Patient>> {
    query(api, search_term.to_string(), |api, term| async move {
        let params = term_params(&term);
        if params.is_empty() {
            api.patients().get_all().await
        } else {
            api.patients().search(&params).await
        }
    })
}

pub fn use_patient<Tr: Transport>(api: &Api<Tr>, id: &str) -> ApiQuery<String, Patient> {
    query(api, id.to_string(), |api, id| async move { api.patients().get_by_id(&id).await })
}

pub fn use_create_patient<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<NewPatient, Patient> {
    mutation(api, |api, draft: NewPatient| async move {
        draft.validate()?;
        api.patients().create(&draft).await
    })
}

pub fn use_update_patient<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<Edit<NewPatient>, Patient> {
    mutation(api, |api, (id, draft): Edit<NewPatient>| async move {
        draft.validate()?;
        api.patients().update(&id, &draft).await
    })
}

pub fn use_delete_patient<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, ()> {
    mutation(api, |api, id: String| async move {
        api.patients().delete(&id).await.map(Envelope::Bare)
    })
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

pub fn use_appointments<Tr: Transport>(
    api: &Api<Tr>,
    filter: AppointmentFilter,
) -> ApiQuery<AppointmentFilter, Vec<Appointment>> {
    query(api, filter, |api, filter| async move {
        let params = filter.to_params();
        if params.is_empty() {
            api.appointments().get_all().await
        } else {
            api.appointments().search(&params).await
        }
    })
}

pub fn use_appointment<Tr: Transport>(api: &Api<Tr>, id: &str) -> ApiQuery<String, Appointment> {
    query(api, id.to_string(), |api, id| async move { api.appointments().get_by_id(&id).await })
}

pub fn use_create_appointment<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<NewAppointment, Appointment> {
    mutation(api, |api, draft: NewAppointment| async move {
        draft.validate()?;
        api.appointments().create(&draft).await
    })
}

pub fn use_update_appointment<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<NewAppointment>, Appointment> {
    mutation(api, |api, (id, draft): Edit<NewAppointment>| async move {
        draft.validate()?;
        api.appointments().update(&id, &draft).await
    })
}

pub fn use_update_appointment_status<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<AppointmentStatusUpdate>, Appointment> {
    mutation(api, |api, (id, update): Edit<AppointmentStatusUpdate>| async move {
        update.validate()?;
        api.appointments().update_status(&id, &update).await
    })
}

pub fn use_delete_appointment<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, ()> {
    mutation(api, |api, id: String| async move {
        api.appointments().delete(&id).await.map(Envelope::Bare)
    })
}

// ---------------------------------------------------------------------------
// Staff & departments
// ---------------------------------------------------------------------------

pub fn use_staff<Tr: Transport>(api: &Api<Tr>, search_term: &str) -> ApiQuery<String, Vec<StaffMember>> {
    query(api, search_term.to_string(), |api, term| async move {
        let params = term_params(&term);
        if params.is_empty() {
            api.staff().get_all().await
        } else {
            api.staff().search(&params).await
        }
    })
}

pub fn use_staff_member<Tr: Transport>(api: &Api<Tr>, id: &str) -> ApiQuery<String, StaffMember> {
    query(api, id.to_string(), |api, id| async move { api.staff().get_by_id(&id).await })
}

pub fn use_create_staff<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<NewStaffMember, StaffMember> {
    mutation(api, |api, draft: NewStaffMember| async move {
        draft.validate()?;
        api.staff().create(&draft).await
    })
}

pub fn use_update_staff<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<Edit<NewStaffMember>, StaffMember> {
    mutation(api, |api, (id, draft): Edit<NewStaffMember>| async move {
        draft.validate()?;
        api.staff().update(&id, &draft).await
    })
}

pub fn use_delete_staff<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, ()> {
    mutation(api, |api, id: String| async move {
        api.staff().delete(&id).await.map(Envelope::Bare)
    })
}

pub fn use_departments<Tr: Transport>(api: &Api<Tr>) -> ApiQuery<(), Vec<Department>> {
    query(api, (), |api, ()| async move { api.departments().get_all().await })
}

// ---------------------------------------------------------------------------
// Prescriptions
// ---------------------------------------------------------------------------

pub fn use_prescriptions<Tr: Transport>(
    api: &Api<Tr>,
    search_term: &str,
) -> ApiQuery<String, Vec<Prescription>> {
    query(api, search_term.to_string(), |api, term| async move {
        let params = term_params(&term);
        if params.is_empty() {
            api.prescriptions().get_all().await
        } else {
            api.prescriptions().search(&params).await
        }
    })
}

pub fn use_prescription<Tr: Transport>(api: &Api<Tr>, id: &str) -> ApiQuery<String, Prescription> {
    query(api, id.to_string(), |api, id| async move { api.prescriptions().get_by_id(&id).await })
}

pub fn use_create_prescription<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<NewPrescription, Prescription> {
    mutation(api, |api, draft: NewPrescription| async move {
        draft.validate()?;
        api.prescriptions().create(&draft).await
    })
}

pub fn use_update_prescription<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<NewPrescription>, Prescription> {
    mutation(api, |api, (id, draft): Edit<NewPrescription>| async move {
        draft.validate()?;
        api.prescriptions().update(&id, &draft).await
    })
}

pub fn use_confirm_payment<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, Prescription> {
    mutation(api, |api, id: String| async move {
        api.prescriptions().confirm_payment(&id).await
    })
}

pub fn use_delete_prescription<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, ()> {
    mutation(api, |api, id: String| async move {
        api.prescriptions().delete(&id).await.map(Envelope::Bare)
    })
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

pub fn use_transfer_requests<Tr: Transport>(
    api: &Api<Tr>,
    status: Option<&str>,
) -> ApiQuery<Option<String>, Vec<TransferRequest>> {
    query(api, status.map(str::to_string), |api, status| async move {
        let params = SearchParams::new().param_opt("TrangThai", status);
        if params.is_empty() {
            api.transfer_requests().get_all().await
        } else {
            api.transfer_requests().search(&params).await
        }
    })
}

pub fn use_create_transfer_request<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<NewTransferRequest, TransferRequest> {
    mutation(api, |api, draft: NewTransferRequest| async move {
        draft.validate()?;
        api.transfer_requests().create(&draft).await
    })
}

pub fn use_approve_transfer_request<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<Approval>, TransferRequest> {
    mutation(api, |api, (id, decision): Edit<Approval>| async move {
        decision.validate()?;
        api.transfer_requests().approve(&id, &decision).await
    })
}

pub fn use_transfer_records<Tr: Transport>(api: &Api<Tr>) -> ApiQuery<(), Vec<TransferRecord>> {
    query(api, (), |api, ()| async move { api.transfer_records().get_all().await })
}

pub fn use_create_transfer_record<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<NewTransferRecord, TransferRecord> {
    mutation(api, |api, draft: NewTransferRecord| async move {
        draft.validate()?;
        api.transfer_records().create(&draft).await
    })
}

// ---------------------------------------------------------------------------
// Work schedules, shift changes, leave
// ---------------------------------------------------------------------------

pub fn use_schedules<Tr: Transport>(api: &Api<Tr>, range: DateRange) -> ApiQuery<DateRange, Vec<WorkSchedule>> {
    query(api, range, |api, range| async move {
        api.schedules().search(&range.to_params()).await
    })
}

pub fn use_create_schedule<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<NewWorkSchedule, WorkSchedule> {
    mutation(api, |api, draft: NewWorkSchedule| async move {
        draft.validate()?;
        api.schedules().create(&draft).await
    })
}

pub fn use_update_schedule<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<NewWorkSchedule>, WorkSchedule> {
    mutation(api, |api, (id, draft): Edit<NewWorkSchedule>| async move {
        draft.validate()?;
        api.schedules().update(&id, &draft).await
    })
}

pub fn use_delete_schedule<Tr: Transport>(api: &Api<Tr>) -> ApiMutation<String, ()> {
    mutation(api, |api, id: String| async move {
        api.schedules().delete(&id).await.map(Envelope::Bare)
    })
}

pub fn use_shift_change_requests<Tr: Transport>(
    api: &Api<Tr>,
    status: Option<&str>,
) -> ApiQuery<Option<String>, Vec<ShiftChangeRequest>> {
    query(api, status.map(str::to_string), |api, status| async move {
        let params = SearchParams::new().param_opt("TrangThai", status);
        if params.is_empty() {
            api.shift_changes().get_all().await
        } else {
            api.shift_changes().search(&params).await
        }
    })
}

pub fn use_create_shift_change_request<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<NewShiftChangeRequest, ShiftChangeRequest> {
    mutation(api, |api, draft: NewShiftChangeRequest| async move {
        draft.validate()?;
        api.shift_changes().create(&draft).await
    })
}

pub fn use_approve_shift_change<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<Approval>, ShiftChangeRequest> {
    mutation(api, |api, (id, decision): Edit<Approval>| async move {
        decision.validate()?;
        api.shift_changes().approve(&id, &decision).await
    })
}

pub fn use_leave_requests<Tr: Transport>(
    api: &Api<Tr>,
    status: Option<&str>,
) -> ApiQuery<Option<String>, Vec<LeaveRequest>> {
    query(api, status.map(str::to_string), |api, status| async move {
        let params = SearchParams::new().param_opt("TrangThai", status);
        if params.is_empty() {
            api.leave_requests().get_all().await
        } else {
            api.leave_requests().search(&params).await
        }
    })
}

pub fn use_create_leave_request<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<NewLeaveRequest, LeaveRequest> {
    mutation(api, |api, draft: NewLeaveRequest| async move {
        draft.validate()?;
        api.leave_requests().create(&draft).await
    })
}

pub fn use_approve_leave_request<Tr: Transport>(
    api: &Api<Tr>,
) -> ApiMutation<Edit<Approval>, LeaveRequest> {
    mutation(api, |api, (id, decision): Edit<Approval>| async move {
        decision.validate()?;
        api.leave_requests().approve(&id, &decision).await
    })
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub fn use_dashboard_stats<Tr: Transport>(api: &Api<Tr>) -> ApiQuery<(), DashboardStats> {
    query(api, (), |api, ()| async move { api.dashboard_stats().await })
}
