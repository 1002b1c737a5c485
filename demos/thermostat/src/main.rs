//! Thermostat demo: a device shadow syncing with a simulated cloud.
//!
//! Registers three properties, mutates them the way a control loop
//! would, polls for outbound reports, and applies a simulated inbound
//! update. Run with `RUST_LOG=debug` to see the sync layer's events.

use std::error::Error;
use std::time::Duration;

use shadowsync_codec::{CborWriter, Value};
use shadowsync_core::{DeviceShadow, Permission, Var};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let temperature = Var::new(20.5f64);
    let setpoint = Var::new(21.0f64);
    let heating = Var::new(false);
    let uptime = Var::new(0i64);

    let mut shadow = DeviceShadow::new();
    shadow
        .add_property(&temperature, "temperature")?
        .permission(Permission::Read)
        .min_delta(0.25);
    shadow
        .add_property(&uptime, "uptime")?
        .permission(Permission::Read)
        .publish_every(Duration::from_secs(60));
    shadow
        .add_property(&setpoint, "setpoint")?
        .on_update(|value| info!(%value, "cloud changed the setpoint"));
    shadow.add_property(&heating, "heating")?;

    let mut buf = [0u8; 256];

    // First control-loop iteration: everything is in sync
    assert_eq!(shadow.poll(&mut buf)?, 0);
    info!("nothing to send after registration");

    // The sensor moved past the delta threshold
    temperature.set(21.2);
    heating.set(true);
    let n = shadow.poll(&mut buf)?;
    info!(bytes = n, payload = %hex(&buf[..n]), "outbound report");

    // The cloud lowers the setpoint
    let inbound = cloud_sets_setpoint(19.5);
    let applied = shadow.decode(&inbound)?;
    info!(applied, setpoint = setpoint.get(), "inbound update applied");

    let mut diagnostics = String::new();
    shadow.dump(&mut diagnostics)?;
    print!("{diagnostics}");

    Ok(())
}

/// What the cloud peer would transmit: `[{"n": "setpoint", "v": v}]`.
fn cloud_sets_setpoint(value: f64) -> Vec<u8> {
    let mut writer = CborWriter::new();
    writer.array(1);
    writer.map(2);
    writer.text("n");
    writer.text("setpoint");
    writer.text("v");
    writer.value(&Value::Float(value));
    writer.into_bytes()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
