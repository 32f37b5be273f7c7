use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use shared_models::error::ApiError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_AGE: i32 = 30;
pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 100.0;

/// The pets service sends numeric or string ids depending on the endpoint.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub breed_id: Option<String>,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub owner_email: String,
}

impl Pet {
    /// Trimmed, case-insensitive match over name, species, breed and owner.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.name.as_str()),
            Some(self.species.as_str()),
            self.breed.as_deref(),
            Some(self.owner_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter_pets(pets: Vec<Pet>, term: Option<&str>) -> Vec<Pet> {
    match term {
        Some(term) if !term.trim().is_empty() => pets.into_iter().filter(|p| p.matches(term)).collect(),
        _ => pets,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breed {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPetRequest {
    pub species: String,
    pub breed_id: String,
    pub name: String,
    pub age: i32,
    pub sex: String,
    pub weight: f64,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetRequest {
    pub name: String,
    pub age: i32,
    pub sex: String,
    pub weight: f64,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetListQuery {
    pub species: Option<String>,
    pub breed: Option<String>,
    pub name: Option<String>,
    /// Free-text search run by the pets service itself.
    pub query: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreedQuery {
    pub species: Option<String>,
}

fn check_common(
    problems: &mut Vec<String>,
    name: &str,
    age: i32,
    sex: &str,
    weight: f64,
    owner_name: &str,
    owner_email: &str,
) {
    if name.trim().is_empty() {
        problems.push("Nome é obrigatório".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        problems.push(format!("Nome deve ter no máximo {} caracteres", MAX_NAME_LEN));
    }

    if !(0..=MAX_AGE).contains(&age) {
        problems.push(format!("Idade deve estar entre 0 e {}", MAX_AGE));
    }

    if !matches!(sex, "male" | "female") {
        problems.push("Sexo deve ser 'male' ou 'female'".to_string());
    }

    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        problems.push(format!("Peso deve estar entre {} e {}", MIN_WEIGHT, MAX_WEIGHT));
    }

    if owner_name.trim().is_empty() {
        problems.push("Nome do tutor é obrigatório".to_string());
    }

    if !EMAIL_RE.is_match(owner_email.trim()) {
        problems.push("E-mail do tutor inválido".to_string());
    }
}

fn into_result(problems: Vec<String>) -> Result<(), ApiError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(problems.join("; ")))
    }
}

impl RegisterPetRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();

        if self.species.trim().is_empty() {
            problems.push("Espécie é obrigatória".to_string());
        }
        if self.breed_id.trim().is_empty() {
            problems.push("ID da Raça é obrigatório".to_string());
        }

        check_common(
            &mut problems,
            &self.name,
            self.age,
            &self.sex,
            self.weight,
            &self.owner_name,
            &self.owner_email,
        );

        into_result(problems)
    }
}

impl UpdatePetRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        check_common(
            &mut problems,
            &self.name,
            self.age,
            &self.sex,
            self.weight,
            &self.owner_name,
            &self.owner_email,
        );
        into_result(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn registration() -> RegisterPetRequest {
        RegisterPetRequest {
            species: "Cachorro".into(),
            breed_id: "b-1".into(),
            name: "Rex".into(),
            age: 3,
            sex: "male".into(),
            weight: 28.5,
            owner_name: "Ana".into(),
            owner_email: "ana@example.com".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn blank_breed_is_rejected() {
        let mut request = registration();
        request.breed_id = "   ".into();
        assert_matches!(request.validate(), Err(ApiError::Validation(msg)) if msg.contains("Raça"));
    }

    #[test]
    fn ranges_are_enforced() {
        let mut request = registration();
        request.age = 31;
        request.weight = 0.05;
        request.sex = "m".into();
        request.owner_email = "ana@".into();
        request.name = "x".repeat(101);

        let err = request.validate().unwrap_err();
        assert_matches!(err, ApiError::Validation(msg) => {
            assert!(msg.contains("Idade"));
            assert!(msg.contains("Peso"));
            assert!(msg.contains("Sexo"));
            assert!(msg.contains("E-mail"));
            assert!(msg.contains("Nome deve ter"));
        });
    }

    #[test]
    fn update_ignores_species_and_breed() {
        let update = UpdatePetRequest {
            name: "Rex".into(),
            age: 0,
            sex: "female".into(),
            weight: 100.0,
            owner_name: "Ana".into(),
            owner_email: "ana@example.com".into(),
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let pet: Pet = serde_json::from_value(json!({
            "id": 12, "name": "Mia", "species": "Gato", "breedId": 4
        }))
        .unwrap();
        assert_eq!(pet.id, "12");
        assert_eq!(pet.breed_id.as_deref(), Some("4"));
        assert_eq!(pet.breed, None);
    }

    #[test]
    fn local_filter_matches_breed_and_owner() {
        let pets: Vec<Pet> = serde_json::from_value(json!([
            {"id": "1", "name": "Rex", "species": "Cachorro", "breed": "Labrador", "ownerName": "Ana"},
            {"id": "2", "name": "Mia", "species": "Gato", "ownerName": "Bruno"},
        ]))
        .unwrap();

        assert_eq!(filter_pets(pets.clone(), Some("  LABRA ")).len(), 1);
        assert_eq!(filter_pets(pets.clone(), Some("bruno"))[0].id, "2");
        assert_eq!(filter_pets(pets.clone(), Some("")).len(), 2);
        assert_eq!(filter_pets(pets, None).len(), 2);
    }
}
