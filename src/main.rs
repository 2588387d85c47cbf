use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::info;

use cloudspan::{ComputeService, Hardware, Image, Location, NodeMetadata, NodeSpec, ProviderConfig};

#[derive(Parser)]
#[command(name = "cloudspan")]
#[command(about = "Drive compute clouds through one provider-independent API")]
#[command(version)]
struct Cli {
    /// Path to a TOML profile file holding provider configurations
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Provider id, or the profile name when --profile is given
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Provider option as key=value; may be repeated
    #[arg(long = "option", global = true, value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Enable debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all nodes
    Nodes,
    /// Show one node in detail
    Node { id: String },
    /// List available images
    Images,
    /// List hardware profiles
    Hardware,
    /// List locations
    Locations,
    /// Create a node
    Create {
        #[arg(long)]
        name: String,
        /// Image id, as listed by `images`
        #[arg(long)]
        image: String,
        /// Hardware id, as listed by `hardware`
        #[arg(long)]
        hardware: String,
        #[arg(long)]
        location: Option<String>,
        /// Wait until the node reports running
        #[arg(long)]
        wait: bool,
    },
    /// Destroy a node
    Destroy {
        id: String,
        /// Wait until the provider stops reporting the node
        #[arg(long)]
        wait: bool,
    },
    /// Reboot a node
    Reboot { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = resolve_config(&cli)?;
    let service = ComputeService::builder(config).build().await?;
    info!("connected to provider {}", service.provider());

    match cli.command {
        Command::Nodes => {
            print_nodes(&service.list_nodes().await?);
        }
        Command::Node { id } => match service.get_node(&id).await? {
            Some(node) => print_node_detail(&node),
            None => return Err(format!("node {} not found", id).into()),
        },
        Command::Images => {
            print_images(&service.list_images().await?);
        }
        Command::Hardware => {
            print_hardware(&service.list_hardware().await?);
        }
        Command::Locations => {
            print_locations(&service.list_locations().await?);
        }
        Command::Create {
            name,
            image,
            hardware,
            location,
            wait,
        } => {
            let mut spec = NodeSpec::new(name, image, hardware);
            if let Some(location) = location {
                spec = spec.with_location(location);
            }
            let node = if wait {
                service.create_node_and_wait(&spec).await?
            } else {
                service.create_node(&spec).await?
            };
            print_node_detail(&node);
        }
        Command::Destroy { id, wait } => {
            if wait {
                service.destroy_node_and_wait(&id).await?;
            } else {
                service.destroy_node(&id).await?;
            }
            println!("destroyed {}", id);
        }
        Command::Reboot { id } => {
            service.reboot_node(&id).await?;
            println!("rebooted {}", id);
        }
    }

    Ok(())
}

/// Build the provider config from --profile/--provider/--option.
///
/// With --profile, the --provider flag selects the profile inside the
/// file and defaults to `default`. Without it, --provider names the
/// provider directly. --option entries override either source.
fn resolve_config(cli: &Cli) -> Result<ProviderConfig, Box<dyn Error + Send + Sync>> {
    let mut config = match &cli.profile {
        Some(path) => {
            let profile = cli.provider.as_deref().unwrap_or("default");
            ProviderConfig::from_profile_file(path, profile)?
        }
        None => {
            let provider = cli
                .provider
                .as_deref()
                .ok_or("either --provider or --profile is required")?;
            ProviderConfig::new(provider)
        }
    };

    for option in &cli.options {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| format!("option '{}' is not of the form key=value", option))?;
        config = config.with_option(key, value);
    }
    Ok(config)
}

fn print_nodes(nodes: &[NodeMetadata]) {
    println!(
        "{:<16} {:<24} {:<12} {:<16} ADDRESSES",
        "ID", "NAME", "STATE", "HARDWARE"
    );
    for node in nodes {
        let addresses: Vec<&str> = node
            .public_addresses
            .iter()
            .chain(&node.private_addresses)
            .map(String::as_str)
            .collect();
        println!(
            "{:<16} {:<24} {:<12} {:<16} {}",
            node.id,
            node.name,
            node.state.to_string(),
            node.hardware_id.as_deref().unwrap_or("-"),
            addresses.join(",")
        );
    }
}

fn print_node_detail(node: &NodeMetadata) {
    println!("id:        {}", node.id);
    println!("name:      {}", node.name);
    println!("state:     {}", node.state);
    println!("provider:  {}", node.provider);
    println!("location:  {}", node.location_id.as_deref().unwrap_or("-"));
    println!("image:     {}", node.image_id.as_deref().unwrap_or("-"));
    println!("hardware:  {}", node.hardware_id.as_deref().unwrap_or("-"));
    println!("public:    {}", node.public_addresses.join(","));
    println!("private:   {}", node.private_addresses.join(","));
    if let Some(created_at) = node.created_at {
        println!("created:   {}", created_at.to_rfc3339());
    }
}

fn print_images(images: &[Image]) {
    println!("{:<40} {:<32} {:<10} {:<8} SIZE", "ID", "NAME", "OS", "PUBLIC");
    for image in images {
        println!(
            "{:<40} {:<32} {:<10} {:<8} {}",
            image.id,
            image.name,
            image.os_family.as_deref().unwrap_or("-"),
            image.public,
            format_size(image.size_bytes)
        );
    }
}

fn print_hardware(profiles: &[Hardware]) {
    println!("{:<16} {:<32} {:>6} {:>10} {:>8}", "ID", "NAME", "CORES", "RAM_MB", "DISK_GB");
    for hardware in profiles {
        let disk = hardware
            .disk_gb
            .map(|gb| gb.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<32} {:>6} {:>10} {:>8}",
            hardware.id, hardware.name, hardware.cores, hardware.ram_mb, disk
        );
    }
}

fn print_locations(locations: &[Location]) {
    println!("{:<20} {:<24} COUNTRY", "ID", "NAME");
    for location in locations {
        println!(
            "{:<20} {:<24} {}",
            location.id,
            location.name,
            location.country.as_deref().unwrap_or("-")
        );
    }
}

fn format_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) if bytes >= 1024 * 1024 * 1024 => {
            format!("{:.1}G", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
        Some(bytes) => format!("{}M", bytes / (1024 * 1024)),
        None => "-".to_string(),
    }
}
