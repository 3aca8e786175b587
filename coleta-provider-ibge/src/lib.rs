//! Geographic reference provider using the IBGE localidades API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use coleta_core::{
    model::{CityName, StateCode},
    ports::{GeoReferencePort, PortError},
};

/// Public IBGE endpoint serving federative units and municipalities.
pub const DEFAULT_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// Single entry from /estados
#[derive(Debug, Deserialize)]
struct UfEntry {
    sigla: String,
    // id, nome and regiao exist as well, only the code is needed
}

/// Single entry from /estados/{uf}/municipios
#[derive(Debug, Deserialize)]
struct MunicipioEntry {
    nome: String,
}

/// State and city lookups against IBGE.
pub struct IbgeGeoPort {
    client: Client,
    base_url: String,
}

impl IbgeGeoPort {
    /// Create a new port bound to the given HTTP client and API root.
    #[must_use]
    pub fn new<U: Into<String>>(client: Client, base_url: U) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn states_request(&self) -> RequestBuilder {
        self.client.get(format!("{}/estados", self.base_url))
    }

    fn cities_request(&self, state: &StateCode) -> RequestBuilder {
        self.client
            .get(format!("{}/estados/{state}/municipios", self.base_url))
            .query(&[("orderBy", "nome")])
    }
}

#[async_trait]
impl GeoReferencePort for IbgeGeoPort {
    async fn states(&self) -> Result<Vec<StateCode>, PortError> {
        let entries = fetch_json::<Vec<UfEntry>>(self.states_request()).await?;
        state_codes(entries)
    }

    async fn cities(&self, state: &StateCode) -> Result<Vec<CityName>, PortError> {
        let entries = fetch_json::<Vec<MunicipioEntry>>(self.cities_request(state)).await?;
        city_names(entries)
    }
}

/// Build the shared port for the IBGE provider.
#[must_use]
pub fn port<U: Into<String>>(client: Client, base_url: U) -> Arc<dyn GeoReferencePort> {
    Arc::new(IbgeGeoPort::new(client, base_url))
}

/// Validate codes and sort them alphabetically; IBGE orders by numeric id.
fn state_codes(entries: Vec<UfEntry>) -> Result<Vec<StateCode>, PortError> {
    let mut codes = entries
        .into_iter()
        .map(|entry| {
            StateCode::parse(&entry.sigla)
                .ok_or_else(|| PortError::Malformed("blank state code".to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    codes.sort();
    codes.dedup();
    Ok(codes)
}

fn city_names(entries: Vec<MunicipioEntry>) -> Result<Vec<CityName>, PortError> {
    entries
        .into_iter()
        .map(|entry| {
            let name = entry.nome.trim();
            if name.is_empty() {
                Err(PortError::Malformed("blank city name".to_owned()))
            } else {
                Ok(CityName(name.to_owned()))
            }
        })
        .collect()
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    tracing::trace!(?req, "ibge request");
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port_at(base: &str) -> IbgeGeoPort {
        IbgeGeoPort::new(Client::new(), base)
    }

    #[test]
    fn states_url_tolerates_trailing_slash() {
        let request = port_at("https://ibge.test/api/v1/localidades/")
            .states_request()
            .build()
            .expect("valid request");
        assert_eq!(
            request.url().as_str(),
            "https://ibge.test/api/v1/localidades/estados"
        );
    }

    #[test]
    fn cities_url_embeds_state_code() {
        let request = port_at(DEFAULT_BASE_URL)
            .cities_request(&StateCode("SP".to_owned()))
            .build()
            .expect("valid request");
        assert_eq!(
            request.url().path(),
            "/api/v1/localidades/estados/SP/municipios"
        );
        assert_eq!(request.url().query(), Some("orderBy=nome"));
    }

    #[test]
    fn decodes_and_sorts_states() {
        let payload = r#"[
            {"id": 35, "sigla": "SP", "nome": "São Paulo", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}},
            {"id": 33, "sigla": "RJ", "nome": "Rio de Janeiro", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}},
            {"id": 12, "sigla": "AC", "nome": "Acre", "regiao": {"id": 1, "sigla": "N", "nome": "Norte"}}
        ]"#;
        let entries: Vec<UfEntry> = serde_json::from_str(payload).expect("fixture parses");
        let codes = state_codes(entries).expect("valid codes");
        let raw: Vec<&str> = codes.iter().map(StateCode::as_str).collect();
        assert_eq!(raw, vec!["AC", "RJ", "SP"]);
    }

    #[test]
    fn blank_state_code_is_malformed() {
        let entries: Vec<UfEntry> =
            serde_json::from_str(r#"[{"sigla": " "}]"#).expect("fixture parses");
        assert!(matches!(state_codes(entries), Err(PortError::Malformed(_))));
    }

    #[test]
    fn decodes_city_names() {
        let payload = r#"[{"id": 3509502, "nome": "Campinas"}, {"id": 3534401, "nome": "Osasco"}]"#;
        let entries: Vec<MunicipioEntry> = serde_json::from_str(payload).expect("fixture parses");
        let cities = city_names(entries).expect("valid names");
        assert_eq!(
            cities,
            vec![CityName("Campinas".to_owned()), CityName("Osasco".to_owned())]
        );
    }
}
