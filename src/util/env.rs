//! Envy-style deserialization of the process environment.
//!
//! Every configuration value is a string sourced through [`dotenvy`] and
//! decoded into [`Env`] in one pass; callers resolve individual values with
//! the [`Var`] enum via the `var!` macro and parse at the use site.

use std::sync::LazyLock;

use serde::Deserialize;
use serde::de::value::MapDeserializer;
use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);

pub async fn get_var(var: Var) -> EnvResult<&'static str> {
    let vars = ENV_VARS.get_or_try_init(|| async { Env::new() }).await?;
    Ok(match var {
        Var::DatabaseUrl => &vars.database_url,
        Var::ServerApiPort => &vars.server_api_port,
        Var::CorsAllowOrigins => &vars.cors_allow_origins,
        Var::AdminToken => &vars.admin_token,
        Var::OtelExporterEndpoint => &vars.otel_exporter_otlp_endpoint,
        Var::ApiServiceName => &vars.api_service_name,
        Var::ApiTracerName => &vars.api_tracer_name,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    pub database_url: String,
    pub server_api_port: String,
    pub cors_allow_origins: String,
    pub admin_token: String,
    pub otel_exporter_otlp_endpoint: String,
    pub api_service_name: String,
    pub api_tracer_name: String,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        from_env::<Env>()
    }
}

#[derive(Debug)]
pub enum Var {
    DatabaseUrl,
    ServerApiPort,
    CorsAllowOrigins,
    AdminToken,
    OtelExporterEndpoint,
    ApiServiceName,
    ApiTracerName,
}

#[macro_export]
macro_rules! var {
    ($ev:expr) => {
        $crate::util::env::get_var($ev)
    };
}

pub fn from_env<T>() -> EnvResult<T>
where
    T: serde::de::DeserializeOwned,
{
    from_iter(dotenvy::vars())
}

pub fn from_iter<Iter, T>(iter: Iter) -> EnvResult<T>
where
    T: serde::de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let vars: MapDeserializer<'_, _, serde::de::value::Error> =
        MapDeserializer::new(iter.into_iter());

    Ok(T::deserialize(vars)?)
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error("env deserialization error: {0}")]
    Deserialize(#[from] serde::de::value::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    fn fake_vars() -> Vec<(String, String)> {
        [
            ("DATABASE_URL", "postgres://localhost/maratona"),
            ("SERVER_API_PORT", "8180"),
            ("CORS_ALLOW_ORIGINS", "http://localhost:3000"),
            ("ADMIN_TOKEN", "hunter2"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("API_SERVICE_NAME", "maratona-api"),
            ("API_TRACER_NAME", "maratona-tracer"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_from_iter() {
        let env: Env = from_iter(fake_vars()).unwrap();

        assert_eq!(env.server_api_port, "8180");
        assert_eq!(env.admin_token, "hunter2");
    }

    #[test]
    fn test_missing_value() {
        let mut vars = fake_vars();
        vars.retain(|(k, _)| k != "ADMIN_TOKEN");

        assert!(from_iter::<_, Env>(vars).is_err());
    }
}
