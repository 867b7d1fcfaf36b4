use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, ConflictCheckResponse};
use crate::repository::AppointmentRepository;

/// Half-open overlap: `[start1, end1)` and `[start2, end2)` share at least one instant.
pub fn intervals_overlap(
    start1: NaiveTime,
    end1: NaiveTime,
    start2: NaiveTime,
    end2: NaiveTime,
) -> bool {
    start1 < end2 && start2 < end1
}

/// `start + duration_minutes`, or `None` if the result would not land later on the same day.
/// An end of exactly 24:00 is not representable and is rejected too.
pub fn compute_end_time(start: NaiveTime, duration_minutes: i32) -> Option<NaiveTime> {
    if duration_minutes <= 0 {
        return None;
    }

    let (end, wrapped_seconds) = start.overflowing_add_signed(Duration::minutes(duration_minutes as i64));
    (wrapped_seconds == 0 && end > start).then_some(end)
}

/// Appointments among `existing` that block `[start, end)`.
pub fn find_conflicts<'a>(
    existing: &'a [Appointment],
    start: NaiveTime,
    end: NaiveTime,
    exclude_appointment_id: Option<Uuid>,
) -> Vec<&'a Appointment> {
    existing
        .iter()
        .filter(|apt| Some(apt.id) != exclude_appointment_id)
        .filter(|apt| apt.status.blocks_slot())
        .filter(|apt| intervals_overlap(start, end, apt.start_time, apt.end_time))
        .collect()
}

pub struct ConflictDetectionService {
    repository: Arc<dyn AppointmentRepository>,
}

impl ConflictDetectionService {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    /// Appointments of a dentist on one day that block `[start_time, end_time)`.
    pub async fn find_conflicting(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Checking conflicts for dentist {} on {} from {} to {}",
               dentist_id, date, start_time, end_time);

        let existing = self.repository.list_for_dentist_on(dentist_id, date).await?;

        let conflicting: Vec<Appointment> =
            find_conflicts(&existing, start_time, end_time, exclude_appointment_id)
                .into_iter()
                .cloned()
                .collect();

        if !conflicting.is_empty() {
            warn!("Conflict detected for dentist {} - {} conflicting appointments",
                  dentist_id, conflicting.len());
        }

        Ok(conflicting)
    }

    /// Same check, reduced to the occupied intervals.
    pub async fn check_conflicts(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let conflicting_slots: Vec<_> = self
            .find_conflicting(dentist_id, date, start_time, end_time, None)
            .await?
            .iter()
            .map(Appointment::slot)
            .collect();

        Ok(ConflictCheckResponse {
            has_conflict: !conflicting_slots.is_empty(),
            conflicting_slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::models::AppointmentStatus;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn booked(start: NaiveTime, end: NaiveTime, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            dentist_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: start,
            end_time: end,
            status,
            notes: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn back_to_back_slots_do_not_overlap() {
        assert!(!intervals_overlap(t(9, 0), t(9, 30), t(9, 30), t(10, 0)));
        assert!(!intervals_overlap(t(9, 30), t(10, 0), t(9, 0), t(9, 30)));
    }

    #[test]
    fn partial_and_nested_slots_overlap() {
        assert!(intervals_overlap(t(9, 0), t(9, 30), t(9, 15), t(9, 45)));
        assert!(intervals_overlap(t(9, 15), t(9, 45), t(9, 0), t(9, 30)));
        // New booking strictly inside an existing one.
        assert!(intervals_overlap(t(9, 10), t(9, 20), t(9, 0), t(10, 0)));
        // Existing booking strictly inside the new one.
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(9, 30), t(10, 0)));
        assert!(intervals_overlap(t(9, 0), t(9, 30), t(9, 0), t(9, 30)));
    }

    #[test]
    fn end_time_adds_service_duration() {
        assert_eq!(compute_end_time(t(10, 0), 30), Some(t(10, 30)));
        assert_eq!(compute_end_time(t(9, 45), 90), Some(t(11, 15)));
    }

    #[test]
    fn end_time_past_midnight_is_rejected() {
        assert_eq!(compute_end_time(t(23, 30), 45), None);
        assert_eq!(compute_end_time(t(23, 0), 60), None);
        assert_eq!(compute_end_time(t(10, 0), 0), None);
    }

    #[test]
    fn end_time_exactly_at_midnight_is_rejected() {
        assert_eq!(compute_end_time(t(23, 30), 30), None);
        assert_eq!(compute_end_time(t(23, 29), 30), Some(t(23, 59)));
    }

    #[test]
    fn cancelled_and_excluded_appointments_never_conflict() {
        let cancelled = booked(t(9, 0), t(9, 30), AppointmentStatus::Cancelled);
        let confirmed = booked(t(9, 0), t(9, 30), AppointmentStatus::Confirmed);
        let existing = vec![cancelled.clone(), confirmed.clone()];

        let hits = find_conflicts(&existing, t(9, 0), t(9, 30), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, confirmed.id);

        assert!(find_conflicts(&existing, t(9, 0), t(9, 30), Some(confirmed.id)).is_empty());
    }

    #[test]
    fn completed_and_no_show_still_hold_their_slot() {
        let existing = vec![
            booked(t(9, 0), t(9, 30), AppointmentStatus::Completed),
            booked(t(10, 0), t(10, 30), AppointmentStatus::NoShow),
        ];
        assert_eq!(find_conflicts(&existing, t(9, 15), t(10, 15), None).len(), 2);
    }
}
