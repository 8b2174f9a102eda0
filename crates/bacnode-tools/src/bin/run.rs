use bacnode_core::types::BinaryPv;
use bacnode_objects::{Device, UciStore};
use bacnode_tools::bacnet_date_time;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "bacnode-run")]
struct Args {
    /// UCI configuration directory holding the bacnet_* packages.
    #[arg(long, default_value = "/etc/config")]
    config: PathBuf,
    /// Device instance number.
    #[arg(long, default_value_t = 260001)]
    instance: u32,
    /// Seconds between schedule and reporting ticks.
    #[arg(long, default_value_t = 1)]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let store = UciStore::open(&args.config)?;
    let mut device = Device::builder(args.instance)
        .config_store(store)
        .analog_output_observer(|instance: u32, old: &f32, new: &f32| {
            log::info!("analog-output {instance}: {old} -> {new}");
        })
        .binary_output_observer(|instance: u32, old: &BinaryPv, new: &BinaryPv| {
            log::info!("binary-output {instance}: {} -> {}", old.name(), new.name());
        })
        .build();
    let loaded = device.load_persisted()?;
    println!(
        "Device {} running with {loaded} objects. Ctrl+C to stop.",
        args.instance
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = bacnet_date_time(chrono::Local::now().naive_local());
                let writes = device.schedule_timer(&now);
                if writes > 0 {
                    log::debug!("schedule timer issued {writes} writes");
                }
                for notification in device.intrinsic_reporting(now) {
                    log::debug!("event notification {:?}", notification);
                }
                for id in device.cov_pending() {
                    if let Ok(values) = device.cov_values(id) {
                        log::info!("cov {id}: {values:?}");
                    }
                    device.cov_clear(id)?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    log::info!("stopping device {}", args.instance);
    Ok(())
}
