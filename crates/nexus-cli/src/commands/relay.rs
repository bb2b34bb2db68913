//! Relay command handler

use anyhow::Result;

use nexus_core::sync::{RelayServer, RelayServerConfig};
use nexus_core::Config;

use crate::output::Output;

/// Run the relay server until interrupted
pub async fn run(config: &Config, bind: Option<String>, output: &Output) -> Result<()> {
    let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let server = RelayServer::new(RelayServerConfig {
        bind_addr: bind_addr.clone(),
        ..RelayServerConfig::default()
    });

    output.message(&format!("Relay listening on ws://{}", bind_addr));
    output.message("Press Ctrl-C to stop.");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            output.message("Relay stopped.");
            Ok(())
        }
    }
}
