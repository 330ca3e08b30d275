use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset. Targets are the workspace crate names.
const DEFAULT_FILTER: &str =
    "invoice_api=debug,invoice_pipeline=debug,invoice_infra=debug,tower_http=debug";

/// Initialize tracing with an env-driven filter and the compact fmt layer
pub fn init_telemetry(service_name: &str, environment: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()?;

    tracing::info!(
        service = service_name,
        environment = environment,
        "Tracing initialized"
    );
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_names_workspace_crates() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        for target in ["invoice_api", "invoice_pipeline", "invoice_infra"] {
            assert!(DEFAULT_FILTER.contains(&format!("{}=", target)));
        }
    }
}
