use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Appointment;
use crate::services::date;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub class_names: Vec<String>,
    pub appointment: Appointment,
}

impl From<&Appointment> for CalendarEvent {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.clone(),
            title: format!("{} - {}", appointment.pet_name, appointment.service_type),
            start: appointment.date_obj,
            end: date::calendar_end(appointment.date_obj),
            class_names: vec![
                format!("status-{}", appointment.status.as_str()),
                appointment.origin.css_class().to_string(),
            ],
            appointment: appointment.clone(),
        }
    }
}

pub fn events(appointments: &[Appointment]) -> Vec<CalendarEvent> {
    appointments.iter().map(CalendarEvent::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAppointment;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared_config::InvalidDatePolicy;

    #[test]
    fn event_spans_one_hour_and_carries_classes() {
        let raw: RawAppointment = serde_json::from_value(json!({
            "id": "a1", "petName": "Rex", "serviceType": "Vacinação",
            "date": "15/05/2024", "time": "10:00", "status": "completed"
        }))
        .unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let appointment = Appointment::from_raw(raw, InvalidDatePolicy::Quarantine, now).unwrap();

        let event = CalendarEvent::from(&appointment);
        assert_eq!(event.title, "Rex - Vacinação");
        assert_eq!(event.end.to_string(), "2024-05-15 11:00:00");
        assert_eq!(event.class_names, vec!["status-completed", "automatic-event"]);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["classNames"][1], "automatic-event");
        assert_eq!(value["appointment"]["formattedDate"], "15/05/2024");
    }
}
