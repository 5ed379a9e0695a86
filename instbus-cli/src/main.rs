//! Command-line shell for the instbus installer modules.
//!
//! Network queries talk to NetworkManager on the system bus; the
//! localization module is served on (and driven over) the session bus.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use instbus::constants::installer;
use instbus::proxies::{LocalizationProxy, TaskProxy};
use instbus::{
    Environment, IpVersion, LocalizationModule, NetworkState, async_run_task, serve_localization,
};

#[derive(Parser)]
#[command(name = "instbus")]
#[command(version, about = "Installer network queries and configuration modules")]
struct Args {
    /// Treat the environment as an offline image install without a
    /// system bus.
    #[arg(long)]
    image: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the overall connectivity state
    State,
    /// List network devices supported by the installer
    Devices,
    /// List devices carrying an activated connection
    Activated,
    /// Show a snapshot of one device
    Show { device: String },
    /// Show the IP configuration of an activated device
    Ip {
        device: String,
        /// Query the IPv6 configuration instead of IPv4
        #[arg(long)]
        ipv6: bool,
    },
    /// List NTP servers handed out by DHCPv4
    Ntp,
    /// Dump the settings of all stored connection profiles
    Settings,
    /// Find connection profiles whose setting equals a string value
    Find {
        section: String,
        key: String,
        value: String,
    },
    /// Serve the localization module on the session bus
    Serve {
        /// Initial language ID in $LANG form
        #[arg(long)]
        language: Option<String>,
    },
    /// Print the served language, or set it
    Language { value: Option<String> },
    /// Install language support into a system root through a task
    InstallLanguage { sysroot: String },
}

fn environment(args: &Args) -> Environment {
    if args.image {
        Environment::image()
    } else {
        Environment::hardware()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let env = environment(&args);

    match args.command {
        Command::State => {
            let net = NetworkState::connect(env).await?;
            println!("{}", net.connectivity_state().await?);
        }
        Command::Devices => {
            let net = NetworkState::connect(env).await?;
            for name in net.list_devices().await? {
                println!("{name}");
            }
        }
        Command::Activated => {
            let net = NetworkState::connect(env).await?;
            for name in net.list_activated_devices().await? {
                println!("{name}");
            }
        }
        Command::Show { device } => {
            let net = NetworkState::connect(env).await?;
            let record = net.device_record(&device).await?;
            println!("device:    {}", record.name);
            println!("type:      {}", record.device_type);
            println!("state:     {}", record.state);
            println!("hwaddr:    {}", record.hw_address);
            match &record.perm_hw_address {
                Some(perm) => println!("permanent: {perm}"),
                None => println!("permanent: (not reported)"),
            }
            println!("preferred: {}", record.preferred_hw_address());
        }
        Command::Ip { device, ipv6 } => {
            let version = if ipv6 { IpVersion::V6 } else { IpVersion::V4 };
            let net = NetworkState::connect(env).await?;
            let config = net.ip_configuration(&device, version).await?;

            if config.is_empty() {
                println!("no {version} configuration (device not activated?)");
                return Ok(());
            }
            for addr in &config.addresses {
                println!("{}/{} via {}", addr.address, addr.prefix, addr.gateway);
            }
            for ns in &config.nameservers {
                println!("nameserver {ns}");
            }
        }
        Command::Ntp => {
            let net = NetworkState::connect(env).await?;
            for server in net.dhcp_ntp_servers().await? {
                println!("{server}");
            }
        }
        Command::Settings => {
            let net = NetworkState::connect(env).await?;
            for settings in net.all_connection_settings().await? {
                println!("{settings:#?}");
            }
        }
        Command::Find {
            section,
            key,
            value,
        } => {
            let net = NetworkState::connect(env).await?;
            let wanted = zvariant::Value::from(value.as_str())
                .try_to_owned()
                .context("value is not representable on the bus")?;
            for path in net
                .find_connections_by_setting(&wanted, &section, &key)
                .await?
            {
                println!("{path}");
            }
        }
        Command::Serve { language } => {
            let mut module = LocalizationModule::new();
            if let Some(language) = language {
                module.set_language(language);
            }

            let connection = zbus::connection::Builder::session()?
                .name(installer::SERVICE)?
                .build()
                .await
                .context("could not claim the installer service name")?;
            serve_localization(&connection, module).await?;

            info!("localization module serving as {}", installer::SERVICE);
            std::future::pending::<()>().await;
        }
        Command::Language { value } => {
            let connection = zbus::Connection::session().await?;
            let proxy = LocalizationProxy::new(&connection).await?;
            match value {
                Some(language) => proxy.set_language(&language).await?,
                None => println!("{}", proxy.language().await?),
            }
        }
        Command::InstallLanguage { sysroot } => {
            let connection = zbus::Connection::session().await?;
            let proxy = LocalizationProxy::new(&connection).await?;

            let task_path = proxy.install_language_with_task(&sysroot).await?;
            let task = TaskProxy::builder(&connection)
                .path(task_path)?
                .build()
                .await?;

            let (tx, rx) = tokio::sync::oneshot::channel();
            async_run_task(task, move |outcome| {
                let _ = tx.send(outcome);
            });

            match rx.await? {
                Ok(()) => println!("language support installed"),
                Err(e) => anyhow::bail!("language installation failed: {e}"),
            }
        }
    }

    Ok(())
}
