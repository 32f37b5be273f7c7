use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentCounts {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub canceled: usize,
}

impl AppointmentCounts {
    pub fn tally(appointments: &[Appointment]) -> Self {
        appointments.iter().fold(Self::default(), |mut counts, a| {
            counts.total += 1;
            match a.status {
                AppointmentStatus::Scheduled => counts.scheduled += 1,
                AppointmentStatus::Completed => counts.completed += 1,
                AppointmentStatus::Canceled => counts.canceled += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentBuckets {
    pub today: Vec<Appointment>,
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
    pub counts: AppointmentCounts,
}

fn by_instant(a: &Appointment, b: &Appointment) -> Ordering {
    a.date_obj.cmp(&b.date_obj).then_with(|| a.id.cmp(&b.id))
}

/// Splits appointments into the dashboard groups relative to `today`.
///
/// Completed and canceled appointments always land in `past`, even when they
/// are dated today or later. Scheduled ones go by their day.
pub fn partition(appointments: &[Appointment], today: NaiveDate) -> AppointmentBuckets {
    let mut buckets = AppointmentBuckets {
        counts: AppointmentCounts::tally(appointments),
        ..AppointmentBuckets::default()
    };

    for appointment in appointments {
        let day = appointment.date_obj.date();
        let scheduled = appointment.status == AppointmentStatus::Scheduled;

        if !scheduled || day < today {
            buckets.past.push(appointment.clone());
        } else if day == today {
            buckets.today.push(appointment.clone());
        } else {
            buckets.upcoming.push(appointment.clone());
        }
    }

    buckets
        .today
        .sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
    buckets.upcoming.sort_by(by_instant);
    buckets.past.sort_by(|a, b| by_instant(b, a));

    buckets
}
