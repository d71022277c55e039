//! Carga de configuración de conexión desde variables de entorno.
//! Convención: `SUPABASE_URL` + `SUPABASE_SERVICE_KEY` y timeout opcional.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub service_key: String,
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let base_url = env::var("SUPABASE_URL").expect("SUPABASE_URL no definido");
        let service_key = env::var("SUPABASE_SERVICE_KEY").expect("SUPABASE_SERVICE_KEY no definido");
        let timeout_secs = env::var("BACKEND_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        Self { base_url,
               service_key,
               timeout_secs }
    }

    /// Variante no-panic para cablear el backend HTTP sólo cuando el entorno
    /// lo define (el binario cae al backend en memoria en caso contrario).
    pub fn maybe_from_env() -> Option<Self> {
        Lazy::force(&DOTENV_LOADED);
        let base_url = env::var("SUPABASE_URL").ok()?;
        let service_key = env::var("SUPABASE_SERVICE_KEY").ok()?;
        let timeout_secs = env::var("BACKEND_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        Some(Self { base_url,
                    service_key,
                    timeout_secs })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
