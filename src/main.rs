use anyhow::Result;
use tracing_subscriber::EnvFilter;

use snmp_poller::config::AppConfig;
use snmp_poller::entity::Integration;
use snmp_poller::formatter::JsonFormatter;
use snmp_poller::snmp::SnmpClientV2c;
use snmp_poller::SnmpCollector;

const INTEGRATION_NAME: &str = "com.snmp-poller.snmp";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("snmp_poller=info".parse()?))
        .init();

    let config = AppConfig::load()?;
    config.log_summary();

    let mut client = SnmpClientV2c::new(
        config.get_target(),
        &config.get_community(),
        &config.settings.connection,
    )
    .await?;

    let mut integration = Integration::new(INTEGRATION_NAME, env!("CARGO_PKG_VERSION"));
    let entity = integration.entity(config.settings.target_host(), "host");

    let report = SnmpCollector::collect_all(&mut client, &config.collection, entity).await;
    tracing::info!(
        records = report.records,
        failed = report.failures.len(),
        skipped_fields = report.skipped_fields,
        "цикл сбора завершен"
    );

    let json = JsonFormatter::to_json_string(&integration, &report)?;
    println!("{}", json);

    Ok(())
}
