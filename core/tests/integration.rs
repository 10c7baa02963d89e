//! End-to-end flows against the live mock backend.
//!
//! # Design
//! Each test starts its own mock server on a random port, so state never
//! leaks between tests, then drives the public API over real HTTP through
//! `UreqTransport`. Request building, envelope unwrapping and error mapping
//! are all exercised together with the actual server.

use chrono::NaiveDate;
use hospital_core::drafts::{
    Approval, AppointmentStatusUpdate, NewAppointment, NewLeaveRequest, NewPatient,
    NewPrescription, NewStaffMember, NewTransferRequest, NewWorkSchedule, PrescriptionItem,
};
use hospital_core::hooks::{self, AppointmentFilter};
use hospital_core::types::status;
use hospital_core::{
    bucket_by_day, cache_key, routes, Api, ApiError, ClientConfig, DateRange, QueryCache,
    SearchParams, UreqTransport,
};

/// Start the mock server on its own runtime and return its API base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

fn api() -> Api<UreqTransport> {
    Api::new(&ClientConfig::new(&start_server()), UreqTransport::new())
}

fn patient(first: &str, last: &str) -> NewPatient {
    NewPatient {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..Default::default()
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn patient_crud_lifecycle() {
    let api = api();
    let patients = api.patients();

    // list: empty
    let all = patients.get_all().await.unwrap().into_data().unwrap();
    assert!(all.is_empty(), "expected empty list");

    // create
    let created = patients
        .create(&patient("An", "Nguyễn"))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(created.full_name(), "Nguyễn An");
    assert!(!created.id.is_empty());
    let id = created.id.clone();

    // get
    let fetched = patients.get_by_id(&id).await.unwrap().into_data().unwrap();
    assert_eq!(fetched, created);

    // update
    let mut edit = patient("An", "Nguyễn");
    edit.phone = Some("0901234567".to_string());
    let updated = patients.update(&id, &edit).await.unwrap().into_data().unwrap();
    assert_eq!(updated.phone.as_deref(), Some("0901234567"));

    // delete, then everything about the id is NotFound
    patients.delete(&id).await.unwrap();
    let err = patients.get_by_id(&id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
    assert_eq!(err.status(), Some(404));
    let err = patients.delete(&id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let all = patients.get_all().await.unwrap().into_data().unwrap();
    assert!(all.is_empty(), "expected empty list after delete");
}

#[tokio::test(flavor = "multi_thread")]
async fn search_patients_by_term() {
    let api = api();
    for (first, last) in [("An", "Lê"), ("Lan", "Phạm"), ("Minh", "Võ")] {
        api.patients().create(&patient(first, last)).await.unwrap();
    }

    let query = hooks::use_patients(&api, "an");
    query.mount().await;
    let names: Vec<_> = query.data().unwrap().iter().map(|p| p.first_name.clone()).collect();
    assert_eq!(names, vec!["An", "Lan"]);
    assert!(!query.loading());
    assert_eq!(query.error(), None);

    // blank term lists everything
    query.set_dependencies("   ".to_string()).await;
    assert_eq!(query.data().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_email_surfaces_backend_message() {
    let api = api();
    let create = hooks::use_create_staff(&api);
    let draft = NewStaffMember {
        first_name: "Bình".to_string(),
        last_name: "Trần".to_string(),
        email: Some("binh@bv.vn".to_string()),
        ..Default::default()
    };

    create.mutate(draft.clone()).await.unwrap();
    let err = create.mutate(draft).await.unwrap_err();

    assert_eq!(err.to_string(), "Email exists");
    assert_eq!(err.status(), Some(409));
    assert_eq!(create.error().as_deref(), Some("Email exists"));
    assert!(!create.loading());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_field_is_an_http_error() {
    let api = api();
    // bypass draft validation to reach the backend's own check
    let err = api
        .patients()
        .create(&serde_json::json!({ "firstName": "An" }))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 400, .. }), "got {err:?}");
    assert_eq!(err.to_string(), "Missing required field: lastName");
}

#[tokio::test(flavor = "multi_thread")]
async fn appointment_status_flow() {
    let api = api();
    let p = api.patients().create(&patient("An", "Lê")).await.unwrap().into_data().unwrap();

    let appointment = hooks::use_create_appointment(&api)
        .mutate(NewAppointment {
            patient: p.id.clone(),
            date: "2024-05-07".to_string(),
            reason: Some("Khám định kỳ".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(appointment.status.as_deref(), Some("ChoKham"));

    let done = hooks::use_update_appointment_status(&api)
        .mutate((
            appointment.id.clone(),
            AppointmentStatusUpdate {
                status: "DaKham".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(done.status.as_deref(), Some("DaKham"));

    let list = hooks::use_appointments(
        &api,
        AppointmentFilter {
            status: Some("DaKham".to_string()),
            ..Default::default()
        },
    );
    list.mount().await;
    assert_eq!(list.data().unwrap().len(), 1);

    list.set_dependencies(AppointmentFilter {
        status: Some("ChoKham".to_string()),
        ..Default::default()
    })
    .await;
    assert!(list.data().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn prescription_payment_is_confirmed_once() {
    let api = api();
    let draft = NewPrescription {
        patient: "p1".to_string(),
        items: vec![PrescriptionItem {
            medicine: "Paracetamol".to_string(),
            dosage: "500mg".to_string(),
            quantity: 10,
            times_per_day: 2,
            days: 5,
        }],
        ..Default::default()
    };
    let prescription = hooks::use_create_prescription(&api).mutate(draft).await.unwrap();
    assert!(!prescription.paid);
    assert_eq!(prescription.total_quantity(), 10);

    let confirm = hooks::use_confirm_payment(&api);
    let paid = confirm.mutate(prescription.id.clone()).await.unwrap();
    assert!(paid.paid);

    let err = confirm.mutate(prescription.id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "Prescription already paid");
}

#[tokio::test(flavor = "multi_thread")]
async fn transfer_approval_updates_dashboard() {
    let api = api();
    let request = hooks::use_create_transfer_request(&api)
        .mutate(NewTransferRequest {
            patient: "p1".to_string(),
            destination: "BV Chợ Rẫy".to_string(),
            reason: "Vượt tuyến".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(request.status.as_deref(), Some(status::PENDING));

    let stats = hooks::use_dashboard_stats(&api);
    stats.mount().await;
    assert_eq!(stats.data().unwrap().pending_transfers, 1);

    let pending = hooks::use_transfer_requests(&api, Some(status::PENDING));
    pending.mount().await;
    assert_eq!(pending.data().unwrap().len(), 1);

    let approved = hooks::use_approve_transfer_request(&api)
        .mutate((request.id.clone(), Approval::approve()))
        .await
        .unwrap();
    assert_eq!(approved.status.as_deref(), Some(status::APPROVED));

    pending.refetch().await;
    assert!(pending.data().unwrap().is_empty());
    stats.refetch().await;
    assert_eq!(stats.data().unwrap().pending_transfers, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn leave_request_rejection_keeps_note() {
    let api = api();
    let leave = hooks::use_create_leave_request(&api)
        .mutate(NewLeaveRequest {
            staff: "u1".to_string(),
            from: day(6),
            to: day(8),
            reason: "Nghỉ phép năm".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(leave.days(), Some(3));

    let rejected = hooks::use_approve_leave_request(&api)
        .mutate((leave.id.clone(), Approval::reject("Thiếu người")))
        .await
        .unwrap();
    assert_eq!(rejected.status.as_deref(), Some(status::REJECTED));
    assert_eq!(rejected.extra.get("GhiChu").and_then(|v| v.as_str()), Some("Thiếu người"));
}

#[tokio::test(flavor = "multi_thread")]
async fn weekly_schedule_view() {
    let api = api();
    let create = hooks::use_create_schedule(&api);
    for (date, shift) in [(day(5), "Sang"), (day(7), "Toi"), (day(7), "Sang"), (day(13), "Chieu")] {
        create
            .mutate(NewWorkSchedule {
                staff: "u1".to_string(),
                work_date: date,
                shift: shift.to_string(),
                department: None,
            })
            .await
            .unwrap();
    }

    let week = DateRange::week_of(day(8));
    let schedules = hooks::use_schedules(&api, week);
    schedules.mount().await;
    let data = schedules.data().unwrap();
    assert_eq!(data.len(), 2);

    let buckets = bucket_by_day(&data, &week);
    let shifts: Vec<_> = buckets[&day(7)].iter().map(|s| s.shift.as_str()).collect();
    assert_eq!(shifts, vec!["Sang", "Toi"]);

    schedules.set_dependencies(week.shift_weeks(1)).await;
    assert_eq!(schedules.data().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_invalidates_cached_list() {
    let api = api();
    let cache = QueryCache::new(100);
    let key = |term: &String| cache_key(routes::PATIENTS, &SearchParams::new().param("q", term));

    let list = hooks::use_patients(&api, "").with_cache(cache.clone(), key);
    list.mount().await;
    assert!(list.data().unwrap().is_empty());
    assert!(cache.contains(routes::PATIENTS));

    let create = hooks::use_create_patient(&api).invalidates(cache.clone(), &[routes::PATIENTS]);
    create.mutate(patient("An", "Lê")).await.unwrap();
    assert!(!cache.contains(routes::PATIENTS));

    list.refetch().await;
    assert_eq!(list.data().unwrap().len(), 1);
    assert!(cache.contains(routes::PATIENTS));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_is_a_transport_error() {
    // bind then drop, so the port is very likely closed
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let api = Api::new(&ClientConfig::new(&format!("http://{addr}/api")), UreqTransport::new());

    let query = hooks::use_departments(&api);
    query.mount().await;

    assert!(query.data().is_none());
    assert!(!query.loading());
    assert!(query.error().is_some());
    let err = api.departments().get_all().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
}
