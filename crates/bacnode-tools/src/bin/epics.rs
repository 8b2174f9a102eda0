use bacnode_tools::{load_device, render, ObjectTypeArg, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bacnode-epics")]
struct Args {
    /// UCI configuration directory holding the bacnet_* packages.
    #[arg(long, default_value = "/etc/config")]
    config: PathBuf,
    /// Device instance number.
    #[arg(long, default_value_t = 260001)]
    instance: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Epics)]
    format: OutputFormat,
    /// Only list objects of this type.
    #[arg(long, value_enum)]
    object_type: Option<ObjectTypeArg>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let device = load_device(&args.config, args.instance)?;
    println!("{}", render(&device, args.object_type, args.format));
    Ok(())
}
