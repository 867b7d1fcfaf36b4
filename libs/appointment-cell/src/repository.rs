// libs/appointment-cell/src/repository.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, warn};
use uuid::Uuid;

use shared_database::supabase::{is_conflict, SupabaseClient};

use crate::models::{Appointment, AppointmentError};

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Every appointment of the dentist on `date`, any status, ordered by start time.
    async fn list_for_dentist_on(&self, dentist_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError>;

    /// Newest first: date descending, then start time descending.
    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    /// Chronological: date ascending, then start time ascending.
    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    /// Chronological, restricted to `from..=to`.
    async fn list_for_dentist_between(
        &self,
        dentist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Persist `appointment` only if the stored row is still at `expected_version`.
    /// The stored version becomes `expected_version + 1`.
    async fn update_if_version(
        &self,
        appointment: Appointment,
        expected_version: i64,
    ) -> Result<Appointment, AppointmentError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    rows: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut appointments: Vec<Appointment> = self.rows.read().await
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.appointment_date, a.start_time));
        appointments
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        self.rows.write().await.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list_for_dentist_on(&self, dentist_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(|a| a.dentist_id == dentist_id && a.appointment_date == date).await)
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.collect(|a| a.patient_id == patient_id).await;
        appointments.reverse();
        Ok(appointments)
    }

    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(|a| a.dentist_id == dentist_id).await)
    }

    async fn list_for_dentist_between(
        &self,
        dentist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .collect(|a| a.dentist_id == dentist_id && a.appointment_date >= from && a.appointment_date <= to)
            .await)
    }

    async fn update_if_version(
        &self,
        appointment: Appointment,
        expected_version: i64,
    ) -> Result<Appointment, AppointmentError> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&appointment.id).ok_or(AppointmentError::NotFound)?;

        if row.version != expected_version {
            return Err(AppointmentError::StaleWrite {
                id: appointment.id,
                expected_version,
            });
        }

        let updated = Appointment {
            version: expected_version + 1,
            ..appointment
        };
        *row = updated.clone();
        Ok(updated)
    }
}

/// PostgREST-backed store over the `appointments` table.
///
/// The table is expected to carry an exclusion constraint over
/// `(dentist_id, appointment_date, [start_time, end_time))` for non-cancelled rows,
/// which surfaces here as HTTP 409.
pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_rows(rows: Vec<serde_json::Value>) -> Result<Vec<Appointment>, AppointmentError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    async fn select(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self.supabase.select(path).await
            .map_err(|e| {
                error!("Appointment query failed: {}", e);
                AppointmentError::DatabaseError(e.to_string())
            })?;
        Self::parse_rows(rows)
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let rows: Vec<serde_json::Value> = self.supabase
            .request(Method::POST, "/rest/v1/appointments", None, Some(body))
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    warn!("Insert of appointment {} rejected by slot constraint", appointment.id);
                    AppointmentError::SlotUnavailable
                } else {
                    AppointmentError::DatabaseError(e.to_string())
                }
            })?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        Ok(self.select(&path).await?.into_iter().next())
    }

    async fn list_for_dentist_on(&self, dentist_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&appointment_date=eq.{}&order=start_time.asc",
            dentist_id, date
        );
        self.select(&path).await
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.desc,start_time.desc",
            patient_id
        );
        self.select(&path).await
    }

    async fn list_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&order=appointment_date.asc,start_time.asc",
            dentist_id
        );
        self.select(&path).await
    }

    async fn list_for_dentist_between(
        &self,
        dentist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&order=appointment_date.asc,start_time.asc",
            dentist_id, from, to
        );
        self.select(&path).await
    }

    async fn update_if_version(
        &self,
        appointment: Appointment,
        expected_version: i64,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&version=eq.{}",
            appointment.id, expected_version
        );
        let body = json!({
            "status": appointment.status,
            "notes": appointment.notes,
            "updated_at": appointment.updated_at,
            "version": expected_version + 1,
        });

        let rows: Vec<serde_json::Value> = self.supabase
            .request(Method::PATCH, &path, None, Some(body))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if let Some(updated) = Self::parse_rows(rows)?.into_iter().next() {
            return Ok(updated);
        }

        // Zero rows: either the row is gone or someone else bumped the version.
        match self.get(appointment.id).await? {
            Some(_) => Err(AppointmentError::StaleWrite {
                id: appointment.id,
                expected_version,
            }),
            None => Err(AppointmentError::NotFound),
        }
    }
}
