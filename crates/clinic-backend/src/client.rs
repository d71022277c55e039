//! Cliente JSON delgado sobre reqwest para la API REST del colaborador
//! (estilo PostgREST: recursos bajo `/rest/v1/`, filtros `col=eq.valor`,
//! respuestas siempre como arreglo de filas).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::error::BackendError;

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_key).map_err(|e| BackendError::Config(format!("service key inválida: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|e| BackendError::Config(format!("service key inválida: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs))
                                             .default_headers(headers)
                                             .build()
                                             .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self { http,
                  base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    /// Ejecuta una petición contra `path` con filtros de query y cuerpo
    /// opcionales. Devuelve las filas de la respuesta (vacío para cuerpos
    /// vacíos, p. ej. un DELETE sin representación).
    pub async fn request(&self,
                         method: Method,
                         path: &str,
                         query: &[(&str, String)],
                         body: Option<Value>)
                         -> Result<Vec<Value>, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http
                          .request(method, &url)
                          .header("Prefer", "return=representation")
                          .query(query);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            log::debug!("colaborador {url} -> {status}: {text}");
            let message = extract_message(&text).unwrap_or_else(|| text.clone());
            return match status.as_u16() {
                404 => Err(BackendError::NotFound(message)),
                409 => Err(BackendError::Conflict(message)),
                code => Err(BackendError::Status { code, message }),
            };
        }

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Array(rows) => Ok(rows),
            single => Ok(vec![single]),
        }
    }
}

/// PostgREST responde errores como `{"message": "..."}`; si el cuerpo no
/// tiene esa forma se usa el texto crudo.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_postgrest_message() {
        let body = r#"{"code":"23505","message":"duplicate key value"}"#;
        assert_eq!(extract_message(body).as_deref(), Some("duplicate key value"));
        assert_eq!(extract_message("sin json"), None);
    }
}
