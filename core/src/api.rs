//! Executing facade: `ApiClient` requests run through a `Transport`.
//!
//! # Design
//! `Api` pairs the stateless builder with a transport and is cheap to clone,
//! so hook closures can own one. Resource groups are typed views over a route
//! family (`api.patients()`, `api.schedules()`, ...). Every group has the same
//! CRUD surface; bespoke verbs are inherent methods on the group for that
//! record type.
//!
//! Calls return the backend envelope unopened; resource cells unwrap it.
//! Failures are logged here and passed back unchanged.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;

use crate::client::{routes, ApiClient, SearchParams};
use crate::config::ClientConfig;
use crate::drafts::{Approval, AppointmentStatusUpdate};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::types::{
    Appointment, DashboardStats, Department, LeaveRequest, Patient, Prescription,
    ShiftChangeRequest, StaffMember, TransferRecord, TransferRequest, WorkSchedule,
};

pub struct Api<Tr> {
    client: ApiClient,
    transport: Arc<Tr>,
}

impl<Tr> Clone for Api<Tr> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<Tr: Transport> Api<Tr> {
    pub fn new(config: &ClientConfig, transport: Tr) -> Self {
        Self {
            client: ApiClient::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    /// Execute `request` and parse an envelope of `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<Envelope<T>, ApiError> {
        let span = tracing::debug_span!("api", method = request.method.as_str(), path = %request.path);
        async {
            let response = self.transport.execute(request).await?;
            self.client.parse(response)
        }
        .instrument(span)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "API request failed"))
    }

    /// Execute `request` and check only its status.
    pub async fn send_empty(&self, request: HttpRequest) -> Result<(), ApiError> {
        let span = tracing::debug_span!("api", method = request.method.as_str(), path = %request.path);
        async {
            let response = self.transport.execute(request).await?;
            self.client.parse_empty(response)
        }
        .instrument(span)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "API request failed"))
    }

    fn group<T>(&self, route: &'static str) -> ResourceGroup<'_, Tr, T> {
        ResourceGroup {
            api: self,
            route,
            _record: PhantomData,
        }
    }

    pub fn patients(&self) -> ResourceGroup<'_, Tr, Patient> {
        self.group(routes::PATIENTS)
    }

    pub fn appointments(&self) -> ResourceGroup<'_, Tr, Appointment> {
        self.group(routes::APPOINTMENTS)
    }

    pub fn staff(&self) -> ResourceGroup<'_, Tr, StaffMember> {
        self.group(routes::STAFF)
    }

    pub fn departments(&self) -> ResourceGroup<'_, Tr, Department> {
        self.group(routes::DEPARTMENTS)
    }

    pub fn prescriptions(&self) -> ResourceGroup<'_, Tr, Prescription> {
        self.group(routes::PRESCRIPTIONS)
    }

    pub fn transfer_requests(&self) -> ResourceGroup<'_, Tr, TransferRequest> {
        self.group(routes::TRANSFER_REQUESTS)
    }

    pub fn transfer_records(&self) -> ResourceGroup<'_, Tr, TransferRecord> {
        self.group(routes::TRANSFER_RECORDS)
    }

    pub fn schedules(&self) -> ResourceGroup<'_, Tr, WorkSchedule> {
        self.group(routes::SCHEDULES)
    }

    pub fn shift_changes(&self) -> ResourceGroup<'_, Tr, ShiftChangeRequest> {
        self.group(routes::SHIFT_CHANGES)
    }

    pub fn leave_requests(&self) -> ResourceGroup<'_, Tr, LeaveRequest> {
        self.group(routes::LEAVE_REQUESTS)
    }

    pub async fn dashboard_stats(&self) -> Result<Envelope<DashboardStats>, ApiError> {
        self.send(self.client.build_get(routes::DASHBOARD_STATS)).await
    }
}

/// CRUD view over one route family, yielding records of type `T`.
pub struct ResourceGroup<'a, Tr, T> {
    api: &'a Api<Tr>,
    route: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<Tr: Transport, T: DeserializeOwned> ResourceGroup<'_, Tr, T> {
    pub fn route(&self) -> &'static str {
        self.route
    }

    pub async fn get_all(&self) -> Result<Envelope<Vec<T>>, ApiError> {
        self.api.send(self.api.client.build_get_all(self.route)).await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Envelope<Vec<T>>, ApiError> {
        self.api.send(self.api.client.build_search(self.route, params)).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Envelope<T>, ApiError> {
        self.api.send(self.api.client.build_get_by_id(self.route, id)).await
    }

    pub async fn create<B: Serialize>(&self, body: &B) -> Result<Envelope<T>, ApiError> {
        let request = self.api.client.build_create(self.route, body)?;
        self.api.send(request).await
    }

    pub async fn update<B: Serialize>(&self, id: &str, body: &B) -> Result<Envelope<T>, ApiError> {
        let request = self.api.client.build_update(self.route, id, body)?;
        self.api.send(request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.send_empty(self.api.client.build_delete(self.route, id)).await
    }

    async fn action<B: Serialize>(
        &self,
        method: HttpMethod,
        id: &str,
        verb: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ApiError> {
        let request = self.api.client.build_action(method, self.route, id, verb, body)?;
        self.api.send(request).await
    }
}

impl<Tr: Transport> ResourceGroup<'_, Tr, Appointment> {
    pub async fn update_status(
        &self,
        id: &str,
        update: &AppointmentStatusUpdate,
    ) -> Result<Envelope<Appointment>, ApiError> {
        self.action(HttpMethod::Patch, id, routes::VERB_STATUS, Some(update)).await
    }
}

impl<Tr: Transport> ResourceGroup<'_, Tr, Prescription> {
    pub async fn confirm_payment(&self, id: &str) -> Result<Envelope<Prescription>, ApiError> {
        self.action::<()>(HttpMethod::Put, id, routes::VERB_PAYMENT, None).await
    }
}

impl<Tr: Transport> ResourceGroup<'_, Tr, TransferRequest> {
    pub async fn approve(
        &self,
        id: &str,
        decision: &Approval,
    ) -> Result<Envelope<TransferRequest>, ApiError> {
        self.action(HttpMethod::Put, id, routes::VERB_APPROVE, Some(decision)).await
    }
}

impl<Tr: Transport> ResourceGroup<'_, Tr, ShiftChangeRequest> {
    pub async fn approve(
        &self,
        id: &str,
        decision: &Approval,
    ) -> Result<Envelope<ShiftChangeRequest>, ApiError> {
        self.action(HttpMethod::Put, id, routes::VERB_APPROVE, Some(decision)).await
    }
}

impl<Tr: Transport> ResourceGroup<'_, Tr, LeaveRequest> {
    pub async fn approve(
        &self,
        id: &str,
        decision: &Approval,
    ) -> Result<Envelope<LeaveRequest>, ApiError> {
        self.action(HttpMethod::Put, id, routes::VERB_APPROVE, Some(decision)).await
    }
}
