use anyhow::Context;
use env_logger::Env;

use sheetjet_lib::config::{DiscoveryConfig, ValveSettings, DEFAULT_REGISTRY_FILE};
use sheetjet_lib::device::Role;
use sheetjet_lib::serial::ValveProtocol;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let storage_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_REGISTRY_FILE.to_string());
    let config = DiscoveryConfig::with_storage_path(storage_path);

    let devices = sheetjet_lib::discover(&config).context("Device discovery failed")?;
    for device in devices.iter() {
        log::info!(
            "{}: hwid={} device={}",
            device.role,
            device.hardware_id.as_deref().unwrap_or("-"),
            device.path.as_deref().unwrap_or("-")
        );
    }

    let path = devices.require_path(Role::SelectorValve)?;
    let mut valve = ValveProtocol::connect(path, &ValveSettings::default())
        .with_context(|| format!("Could not open {} at {}", Role::SelectorValve, path))?;
    let port = valve.get_port().context("Valve status query failed")?;
    log::info!("{} is on port {}", Role::SelectorValve, port);

    Ok(())
}
