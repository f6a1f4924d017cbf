//! Delivery address and the normalization of the two accepted field-naming conventions.
//!
//! Clients send either the Portuguese names (`rua`, `numero`, `bairro`, ...) or the
//! English ones (`street`, `number`, `neighborhood`, ...). Both are folded into
//! [`Address`] before any business logic sees them.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Canonical, fully validated address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub cep: String,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Address as received on the wire, in either naming convention.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddressInput {
    #[serde(default, deserialize_with = "lenient_text")]
    pub cep: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rua: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub numero: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complemento: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complement: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bairro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub neighborhood: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cidade: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub instrucoes: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("missing required address fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl AddressError {
    pub fn missing(&self) -> &[&'static str] {
        match self { Self::MissingFields(fields) => fields }
    }
}

impl AddressInput {
    /// Fold both conventions into an [`Address`].
    ///
    /// The Portuguese name wins when both are present. Blank values count as missing.
    /// Every missing required field is reported, in canonical order.
    pub fn normalize(&self) -> Result<Address, AddressError> {
        let cep = pick(&self.cep, &None);
        let street = pick(&self.rua, &self.street);
        let number = pick(&self.numero, &self.number);
        let neighborhood = pick(&self.bairro, &self.neighborhood);
        let city = pick(&self.cidade, &self.city);
        let state = pick(&self.estado, &self.state);

        let missing: Vec<&'static str> = [
            ("cep", cep.is_none()),
            ("street", street.is_none()),
            ("number", number.is_none()),
            ("neighborhood", neighborhood.is_none()),
            ("city", city.is_none()),
            ("state", state.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (cep, street, number, neighborhood, city, state) {
            (Some(cep), Some(street), Some(number), Some(neighborhood), Some(city), Some(state)) => Ok(Address {
                cep,
                street,
                number,
                complement: pick(&self.complemento, &self.complement),
                neighborhood,
                city,
                state,
                instructions: pick(&self.instrucoes, &self.instructions),
            }),
            _ => Err(AddressError::MissingFields(missing)),
        }
    }
}

fn pick(localized: &Option<String>, english: &Option<String>) -> Option<String> {
    [localized, english]
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts strings and bare numbers (`"numero": 10`), rejects objects and arrays.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected text, found {other}"))),
    }
}
