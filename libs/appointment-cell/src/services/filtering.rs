use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use shared_models::error::ApiError;

use crate::models::{Appointment, AppointmentListQuery, AppointmentStatus};
use crate::services::date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl FromStr for StatusFilter {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() || value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        AppointmentStatus::parse(value)
            .map(Self::Only)
            .ok_or_else(|| ApiError::Validation(format!("Status desconhecido: {}", value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Date,
    PetName,
    ServiceType,
}

impl FromStr for SortKey {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "date" => Ok(Self::Date),
            "petName" | "pet_name" => Ok(Self::PetName),
            "serviceType" | "service_type" => Ok(Self::ServiceType),
            other => Err(ApiError::Validation(format!("Ordenação desconhecida: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ApiError::Validation(format!("Direção desconhecida: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Reselecting the current key flips the direction; a new key starts
    /// ascending.
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.toggled();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub status: StatusFilter,
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
}

impl AppointmentFilter {
    pub fn is_empty(&self) -> bool {
        self.status == StatusFilter::All && self.date.is_none() && self.text.is_none()
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let StatusFilter::Only(status) = self.status {
            if appointment.status != status {
                return false;
            }
        }

        if let Some(day) = self.date {
            if appointment.formatted_date != date::format_day(day) {
                return false;
            }
        }

        match &self.text {
            Some(term) => matches_text(appointment, term),
            None => true,
        }
    }
}

/// Reads list filters and sort from query parameters.
pub fn from_query(query: &AppointmentListQuery) -> Result<(AppointmentFilter, SortState), ApiError> {
    let status = match &query.status {
        Some(s) => s.parse()?,
        None => StatusFilter::All,
    };

    let date = match query.date.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => Some(date::parse_day(d)?),
        _ => None,
    };

    let text = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let sort = SortState {
        key: match &query.sort {
            Some(k) => k.parse()?,
            None => SortKey::default(),
        },
        direction: match &query.direction {
            Some(d) => d.parse()?,
            None => SortDirection::default(),
        },
    };

    Ok((AppointmentFilter { status, date, text }, sort))
}

/// Case-insensitive substring search over every field an admin sees in the
/// list, labels included.
pub fn matches_text(appointment: &Appointment, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [
        appointment.pet_name.as_str(),
        appointment.service_type.as_str(),
        appointment.formatted_date.as_str(),
        appointment.time.as_str(),
        appointment.status.label(),
        appointment.origin.label(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Collation key close to what a pt-BR locale compare does: case and
/// accents are secondary.
pub fn collation_key(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub fn locale_compare(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Total order for a key; ties fall back to the id so that reversing the
/// direction reverses the list exactly.
pub fn compare(a: &Appointment, b: &Appointment, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Date => a.date_obj.cmp(&b.date_obj),
        SortKey::PetName => locale_compare(&a.pet_name, &b.pet_name),
        SortKey::ServiceType => locale_compare(&a.service_type, &b.service_type),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

pub fn sort(appointments: &mut [Appointment], state: SortState) {
    appointments.sort_by(|a, b| match state.direction {
        SortDirection::Asc => compare(a, b, state.key),
        SortDirection::Desc => compare(b, a, state.key),
    });
}

/// Filtered, sorted copy of the set. The input is left untouched.
pub fn apply(
    appointments: &[Appointment],
    filter: &AppointmentFilter,
    state: SortState,
) -> Vec<Appointment> {
    let mut view: Vec<Appointment> = appointments
        .iter()
        .filter(|a| filter.matches(a))
        .cloned()
        .collect();
    sort(&mut view, state);
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentBatch, RawAppointment};
    use serde_json::json;
    use shared_config::InvalidDatePolicy;

    fn sample() -> Vec<Appointment> {
        let raws: Vec<RawAppointment> = serde_json::from_value(json!([
            {"id": "1", "petName": "Thor", "serviceType": "Vacinação", "date": "15/05/2024", "time": "09:00", "status": "scheduled"},
            {"id": "2", "petName": "amora", "serviceType": "Consulta", "date": "2024-05-15", "time": "14:00", "status": "completed"},
            {"id": "3", "petName": "Bidu", "serviceType": "Exames", "date": "16/05/2024", "time": "10:00", "status": "canceled", "origin": "manual"},
            {"id": "4", "petName": "Ágata", "serviceType": "Banho e tosa", "date": "14/05/2024", "time": "11:30", "status": "scheduled"},
            {"id": "5", "petName": "Bidu", "serviceType": "Castração", "date": "15/05/2024", "time": "09:00", "status": "scheduled"},
        ]))
        .unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        AppointmentBatch::from_raw(raws, InvalidDatePolicy::Quarantine, now).appointments
    }

    fn ids(list: &[Appointment]) -> Vec<&str> {
        list.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn all_status_without_other_filters_is_identity() {
        let set = sample();
        let filter = AppointmentFilter::default();
        assert!(filter.is_empty());
        let view: Vec<Appointment> = set.iter().filter(|a| filter.matches(a)).cloned().collect();
        assert_eq!(view, set);
    }

    #[test]
    fn status_filter_is_exact() {
        let filter = AppointmentFilter {
            status: "completed".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &filter, SortState::default())), vec!["2"]);
        assert!("pending".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn date_filter_matches_the_whole_day() {
        let filter = AppointmentFilter {
            date: Some(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &filter, SortState::default())), vec!["1", "5", "2"]);
    }

    #[test]
    fn text_filter_searches_labels_case_insensitively() {
        let set = sample();
        let only = |term: &str| -> Vec<String> {
            let filter = AppointmentFilter { text: Some(term.into()), ..Default::default() };
            apply(&set, &filter, SortState::default()).into_iter().map(|a| a.id).collect()
        };

        assert_eq!(only("vacina"), vec!["1"]);
        assert_eq!(only("VACINA"), vec!["1"]);
        assert_eq!(only("concluído"), vec!["2"]);
        assert_eq!(only("automático"), vec!["1"]);
        assert_eq!(only("14/05"), vec!["4"]);
        assert_eq!(only("11:30"), vec!["4"]);
        assert_eq!(only("bidu"), vec!["5", "3"]);
    }

    #[test]
    fn toggling_direction_reverses_exactly() {
        let set = sample();
        for key in [SortKey::Date, SortKey::PetName, SortKey::ServiceType] {
            let mut state = SortState::default();
            state.select(key);
            if state.direction == SortDirection::Desc {
                state.select(key);
            }
            let asc = apply(&set, &AppointmentFilter::default(), state);
            state.select(key);
            assert_eq!(state.direction, SortDirection::Desc);
            let mut desc = apply(&set, &AppointmentFilter::default(), state);
            desc.reverse();
            assert_eq!(ids(&asc), ids(&desc), "{:?}", key);
        }
    }

    #[test]
    fn pet_names_sort_like_a_locale_compare() {
        let state = SortState { key: SortKey::PetName, direction: SortDirection::Asc };
        let view = apply(&sample(), &AppointmentFilter::default(), state);
        assert_eq!(ids(&view), vec!["4", "2", "3", "5", "1"]);
    }

    #[test]
    fn decomposed_accents_fold_like_precomposed_ones() {
        assert_eq!(collation_key("A\u{301}gata"), "agata");
        assert_eq!(collation_key("Ágata"), collation_key("A\u{301}gata"));
        assert_eq!(collation_key("CASTRAÇÃO"), "castracao");

        let raws: Vec<RawAppointment> = serde_json::from_value(json!([
            {"id": "amora", "petName": "Amora", "serviceType": "Consulta", "date": "15/05/2024", "time": "09:00", "status": "scheduled"},
            {"id": "agata", "petName": "A\u{301}gata", "serviceType": "Consulta", "date": "15/05/2024", "time": "10:00", "status": "scheduled"},
        ]))
        .unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let appointments = AppointmentBatch::from_raw(raws, InvalidDatePolicy::Quarantine, now).appointments;

        let state = SortState { key: SortKey::PetName, direction: SortDirection::Asc };
        let view = apply(&appointments, &AppointmentFilter::default(), state);
        assert_eq!(ids(&view), vec!["agata", "amora"]);
    }

    #[test]
    fn sort_state_machine() {
        let mut state = SortState::default();
        assert_eq!(state, SortState { key: SortKey::Date, direction: SortDirection::Asc });

        state.select(SortKey::Date);
        assert_eq!(state.direction, SortDirection::Desc);

        state.select(SortKey::PetName);
        assert_eq!(state, SortState { key: SortKey::PetName, direction: SortDirection::Asc });

        state.select(SortKey::PetName);
        state.select(SortKey::PetName);
        assert_eq!(state.direction, SortDirection::Asc);
    }

    #[test]
    fn query_parsing() {
        let query = AppointmentListQuery {
            status: Some("all".into()),
            date: Some("2024-05-15".into()),
            q: Some("  ".into()),
            sort: Some("serviceType".into()),
            direction: Some("desc".into()),
        };
        let (filter, sort) = from_query(&query).unwrap();
        assert_eq!(filter.status, StatusFilter::All);
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 5, 15));
        assert_eq!(filter.text, None);
        assert_eq!(sort, SortState { key: SortKey::ServiceType, direction: SortDirection::Desc });

        let bad = AppointmentListQuery { date: Some("ontem".into()), ..Default::default() };
        assert!(from_query(&bad).is_err());
    }
}
