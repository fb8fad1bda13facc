//! CPNU client implementing the provider contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use procesal_provider::error::{ProviderError, ProviderResult};
use procesal_provider::traits::CourtProvider;
use procesal_provider::types::{ProcessSummary, RemoteAction};

use crate::config::ColombiaConfig;
use crate::fecha::Fecha;

/// Court provider for Colombia's Rama Judicial.
pub struct ColombiaProvider {
    config: ColombiaConfig,
    client: Client,
}

impl std::fmt::Debug for ColombiaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColombiaProvider")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl ColombiaProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: ColombiaConfig) -> ProviderResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::InvalidConfiguration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    /// Create a provider with default configuration.
    pub fn with_defaults() -> ProviderResult<Self> {
        Self::new(ColombiaConfig::default())
    }

    async fn get(&self, endpoint: &str, url: &str) -> ProviderResult<reqwest::Response> {
        debug!(url = %url, "CPNU request");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    timeout_secs: self.config.request_timeout_secs,
                }
            } else {
                ProviderError::connection_failed_with_source(
                    format!("request failed: {endpoint}"),
                    e,
                )
            }
        })?;

        classify_status(response.status(), endpoint)?;
        Ok(response)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ProviderResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("bad body from {endpoint}"), e))
    }

    /// Fetch one page of actuaciones.
    async fn actions_page(&self, process_id: &str, page: u32) -> ProviderResult<ActionsResponse> {
        let endpoint = "Proceso/Actuaciones";
        let url = format!(
            "{}/Proceso/Actuaciones/{process_id}?pagina={page}",
            self.config.trimmed_base_url()
        );
        let response = self.get(endpoint, &url).await?;
        self.parse_json(endpoint, response).await
    }
}

#[async_trait]
impl CourtProvider for ColombiaProvider {
    fn jurisdiction(&self) -> &str {
        "Colombia"
    }

    async fn find_by_radicado(&self, radicado: &str) -> ProviderResult<Option<ProcessSummary>> {
        let endpoint = "Procesos/Consulta/NumeroRadicacion";
        let url = format!(
            "{}/Procesos/Consulta/NumeroRadicacion?numero={}&SoloActivos=false&pagina=1",
            self.config.trimmed_base_url(),
            radicado.trim()
        );

        let response = match self.get(endpoint, &url).await {
            Ok(response) => response,
            Err(e) if is_unindexed_search(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body: SearchResponse = self.parse_json(endpoint, response).await?;
        let Some(proceso) = body.procesos.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(proceso.into_summary()))
    }

    async fn process_detail(&self, process_id: &str) -> ProviderResult<Map<String, Value>> {
        let endpoint = "Proceso/Detalle";
        let url = format!(
            "{}/Proceso/Detalle/{process_id}",
            self.config.trimmed_base_url()
        );

        let response = self.get(endpoint, &url).await?;
        let body: Value = self.parse_json(endpoint, response).await?;

        // The detail payload is an open object whose keys vary by process
        // class; keep everything non-null as-is.
        match body {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect()),
            other => Err(ProviderError::InvalidResponse {
                message: format!("expected detail object, got {other}"),
                source: None,
            }),
        }
    }

    async fn process_actions(&self, process_id: &str) -> ProviderResult<Vec<RemoteAction>> {
        let mut actions = Vec::new();
        let mut page = 1;

        loop {
            let body = self.actions_page(process_id, page).await?;
            let total_pages = body
                .paginacion
                .as_ref()
                .map_or(1, |p| p.cantidad_paginas.max(1));

            actions.extend(body.actuaciones.into_iter().map(ActuacionDto::into_action));

            if page >= total_pages {
                break;
            }
            if page >= self.config.max_action_pages {
                warn!(
                    process_id = %process_id,
                    fetched_pages = page,
                    total_pages = total_pages,
                    "stopping at action page cap"
                );
                break;
            }

            page += 1;
            tokio::time::sleep(Duration::from_millis(self.config.pause_between_pages_ms)).await;
        }

        Ok(actions)
    }
}

/// Map an HTTP status to the provider error taxonomy. 429 means the API
/// is throttling us; any other non-2xx is unexpected.
fn classify_status(status: StatusCode, endpoint: &str) -> ProviderResult<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    Err(ProviderError::UnexpectedStatus {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
    })
}

/// The search endpoint answers 404 for radicados the remote system has
/// not indexed yet; that is a no-match, not a failure.
fn is_unindexed_search(e: &ProviderError) -> bool {
    matches!(e, ProviderError::UnexpectedStatus { status: 404, .. })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    procesos: Vec<ProcesoDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcesoDto {
    id_proceso: i64,
    #[serde(default)]
    llave_proceso: Option<String>,
    #[serde(default)]
    es_privado: bool,
    #[serde(default)]
    fecha_proceso: Fecha,
    #[serde(default)]
    fecha_ultima_actuacion: Fecha,
    #[serde(default)]
    despacho: Option<String>,
    #[serde(default)]
    departamento: Option<String>,
    #[serde(default)]
    sujetos_procesales: Option<String>,
}

impl ProcesoDto {
    fn into_summary(self) -> ProcessSummary {
        let mut fields = Map::new();
        if let Some(departamento) = self.departamento {
            fields.insert("departamento".to_string(), Value::from(departamento));
        }
        if let Some(despacho) = self.despacho {
            fields.insert("despacho".to_string(), Value::from(despacho));
        }
        if let Some(sujetos) = self.sujetos_procesales {
            fields.insert("sujetos_procesales".to_string(), Value::from(sujetos));
        }
        if let Some(llave) = self.llave_proceso {
            fields.insert("llave_proceso".to_string(), Value::from(llave));
        }
        if let Some(at) = self.fecha_proceso.into_inner() {
            fields.insert("fecha_proceso".to_string(), Value::from(at.to_rfc3339()));
        }
        if let Some(at) = self.fecha_ultima_actuacion.into_inner() {
            fields.insert(
                "fecha_ultima_actuacion".to_string(),
                Value::from(at.to_rfc3339()),
            );
        }

        ProcessSummary {
            process_id: self.id_proceso.to_string(),
            is_private: self.es_privado,
            fields,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionsResponse {
    #[serde(default)]
    actuaciones: Vec<ActuacionDto>,
    #[serde(default)]
    paginacion: Option<Paginacion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paginacion {
    #[serde(default)]
    cantidad_paginas: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActuacionDto {
    id_reg_actuacion: i64,
    #[serde(default)]
    cons_actuacion: Option<i64>,
    #[serde(default)]
    actuacion: Option<String>,
    #[serde(default)]
    anotacion: Option<String>,
    #[serde(default)]
    fecha_actuacion: Fecha,
    #[serde(default)]
    fecha_registro: Fecha,
    #[serde(default)]
    fecha_inicial: Fecha,
    #[serde(default)]
    fecha_final: Fecha,
    #[serde(default)]
    con_documentos: bool,
}

impl ActuacionDto {
    fn into_action(self) -> RemoteAction {
        let mut extra = Map::new();
        if let Some(cons) = self.cons_actuacion {
            extra.insert("cons_actuacion".to_string(), Value::from(cons));
        }

        RemoteAction {
            external_id: self.id_reg_actuacion.to_string(),
            action_type: self.actuacion.unwrap_or_default(),
            annotation: self.anotacion.unwrap_or_default(),
            action_date: self.fecha_actuacion.into_inner(),
            registration_date: self.fecha_registro.into_inner(),
            initial_date: self.fecha_inicial.into_inner(),
            final_date: self.fecha_final.into_inner(),
            has_documents: self.con_documentos,
            extra,
        }
    }
}
