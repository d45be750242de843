//! oneM2M client CLI binary.
//!
//! Talks to a CSE over the oneM2M HTTP binding.
//!
//! # Commands
//!
//! - `register` - Register an AE with the CSE
//! - `get-ae` - Retrieve a registered AE
//! - `discover` - List container URIs under the CSE base
//! - `create-cin` - Create a content instance in a container
//! - `latest` - Show the latest content instance of a container
//! - `retrieve` - Raw retrieve with an arbitrary parameter set
//! - `update` - Update one attribute of a resource
//! - `delete` - Delete a resource
//! - `subscribe` - Subscribe to a resource and print notifications
//! - `listen` - Run the notification listener only

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use onem2m::{
    listener::Callback, AeBuilder, Config, Cse, HttpTransport, ListenerSupervisor,
    NotificationReply, OneM2MResponse, ParameterSet, Resource, VERSION,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "onem2m")]
#[command(version = VERSION)]
#[command(about = "oneM2M client - HTTP binding", long_about = None)]
struct Cli {
    /// Config file (default: platform config dir/onem2m/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an AE with the CSE
    Register {
        /// App-ID (api)
        #[arg(long)]
        app_id: String,

        /// App name (apn)
        #[arg(long)]
        app_name: Option<String>,

        /// AE-ID credential (aei)
        #[arg(long)]
        ae_id: String,

        /// Point of access URIs (poa)
        #[arg(long, required = true)]
        poa: Vec<String>,
    },

    /// Retrieve a registered AE
    GetAe {
        /// AE-ID
        ae_id: String,
    },

    /// List container URIs under the CSE base resource
    Discover {
        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,
    },

    /// Create a content instance
    CreateCin {
        /// Container URI
        container: String,

        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,

        /// Content (JSON, or plain text)
        #[arg(long)]
        content: String,
    },

    /// Show the latest content instance of a container
    Latest {
        /// Container URI
        container: String,

        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,
    },

    /// Retrieve with a raw parameter set
    Retrieve {
        /// Resource URI
        uri: String,

        /// Parameters as a JSON object, e.g. '{"fr": "C1", "rcn": 2}'
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Update one attribute of a resource
    Update {
        /// Resource URI
        uri: String,

        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,

        /// Resource short name, e.g. m2m:cnt
        #[arg(long)]
        short_name: String,

        /// Attribute name
        #[arg(long)]
        key: String,

        /// Attribute value (JSON, or plain text)
        #[arg(long)]
        value: String,
    },

    /// Delete a resource
    Delete {
        /// Resource URI
        uri: String,

        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,
    },

    /// Subscribe to a resource and print notifications until Ctrl-C
    Subscribe {
        /// Resource URI
        uri: String,

        /// AE-ID to act as
        #[arg(long)]
        ae_id: String,

        /// Subscription name
        #[arg(long, default_value = "onem2m-cli-sub")]
        name: String,

        /// Notification URI (default: the listener's /notify path)
        #[arg(long)]
        notify_uri: Option<String>,
    },

    /// Run the notification listener with logging handlers
    Listen {
        /// Correlation ids to accept
        #[arg(long = "id")]
        ids: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Register {
            app_id,
            app_name,
            ae_id,
            poa,
        } => cmd_register(&config, app_id, app_name, ae_id, poa),
        Commands::GetAe { ae_id } => {
            let mut cse = connect(&config)?;
            print_response(&cse.get_ae(&ae_id)?);
            Ok(())
        },
        Commands::Discover { ae_id } => {
            let cse = connect_as(&config, &ae_id)?;
            for uri in cse.discover_containers()? {
                println!("{uri}");
            }
            Ok(())
        },
        Commands::CreateCin {
            container,
            ae_id,
            content,
        } => {
            let cse = connect_as(&config, &ae_id)?;
            let cin = Resource::content_instance(parse_value(&content))?;
            print_response(&cse.create_content_instance(&container, &cin)?);
            Ok(())
        },
        Commands::Latest { container, ae_id } => {
            let cse = connect_as(&config, &ae_id)?;
            match cse.retrieve_latest_content_instance(&container)? {
                Some(cin) => println!("{}", serde_json::to_string_pretty(&cin.to_body())?),
                None => println!("No content instance found"),
            }
            Ok(())
        },
        Commands::Retrieve { uri, params } => cmd_retrieve(&config, &uri, &params),
        Commands::Update {
            uri,
            ae_id,
            short_name,
            key,
            value,
        } => {
            let cse = connect_as(&config, &ae_id)?;
            let response = cse.update_resource(&uri, &short_name, &key, parse_value(&value))?;
            print_response(&response);
            Ok(())
        },
        Commands::Delete { uri, ae_id } => {
            let cse = connect_as(&config, &ae_id)?;
            print_response(&cse.delete_resource(&uri)?);
            Ok(())
        },
        Commands::Subscribe {
            uri,
            ae_id,
            name,
            notify_uri,
        } => cmd_subscribe(&config, &uri, &ae_id, &name, notify_uri),
        Commands::Listen { ids } => cmd_listen(&config, &ids),
    }
}

fn connect(config: &Config) -> anyhow::Result<Cse<HttpTransport>> {
    Ok(Cse::connect(config.cse.clone(), config.client.timeout())?)
}

/// Connect and adopt an existing AE so later requests carry its originator.
fn connect_as(config: &Config, ae_id: &str) -> anyhow::Result<Cse<HttpTransport>> {
    let mut cse = connect(config)?;
    let response = cse.get_ae(ae_id)?;
    if cse.ae().is_none() {
        anyhow::bail!("AE {ae_id} not found (rsc {})", response.rsc);
    }
    Ok(cse)
}

fn cmd_register(
    config: &Config,
    app_id: String,
    app_name: Option<String>,
    ae_id: String,
    poa: Vec<String>,
) -> anyhow::Result<()> {
    let mut builder = AeBuilder::new(app_id.clone(), ae_id.clone())
        .app_name(app_name.unwrap_or(app_id))
        .request_reachability(true);
    for uri in poa {
        builder = builder.point_of_access(uri);
    }
    let ae = builder.build()?;

    let mut cse = connect(config)?;
    println!("Registering AE \"{ae_id}\" with CSE @ {}", config.cse.host);
    let response = cse.register_ae(&ae)?;
    if !response.is_created() {
        anyhow::bail!("Could not register AE (rsc {})", response.rsc);
    }
    println!("AE registration successful:");
    print_response(&response);
    Ok(())
}

fn cmd_retrieve(config: &Config, uri: &str, params: &str) -> anyhow::Result<()> {
    let mut params = ParameterSet::from_str(params)?;
    if !params.contains("fr") {
        if let Some(originator) = &config.client.originator {
            params.insert("fr", originator.clone());
        }
    }
    let cse = connect(config)?;
    let response = cse.request().retrieve(Some(&cse.to(uri)), Some(params))?;
    print_response(&response);
    Ok(())
}

fn cmd_subscribe(
    config: &Config,
    uri: &str,
    ae_id: &str,
    name: &str,
    notify_uri: Option<String>,
) -> anyhow::Result<()> {
    let cse = connect_as(config, ae_id)?;

    let supervisor = ListenerSupervisor::new();
    let listener = supervisor.get_or_init(&config.listener);
    let addr = listener.start_and_wait()?;
    let notify_uri = notify_uri.unwrap_or_else(|| format!("http://{addr}/notify"));

    let response = cse.create_subscription(uri, name, Some(&notify_uri), &[], None)?;
    if !response.is_created() {
        listener.stop()?;
        anyhow::bail!("Could not create subscription (rsc {})", response.rsc);
    }

    // CSEs report either the hierarchical path or the resource id as `sur`.
    let mut references = vec![format!("{}/{name}", uri.trim_end_matches('/'))];
    if let Some(ri) = response
        .content("m2m:sub")
        .and_then(|sub| sub.get("ri"))
        .and_then(Value::as_str)
    {
        references.push(ri.to_string());
    }
    for reference in &references {
        listener.register(reference, print_notification);
    }

    println!("Subscribed to {uri}; notifications to {notify_uri}. Ctrl-C to exit.");
    wait_for_ctrl_c()?;
    listener.stop()?;
    Ok(())
}

fn cmd_listen(config: &Config, ids: &[String]) -> anyhow::Result<()> {
    let supervisor = ListenerSupervisor::new();
    let listener = supervisor.get_or_init(&config.listener);
    for id in ids {
        listener.register(id, print_notification);
    }
    let addr = listener.start_and_wait()?;
    println!("Listening on {addr} for {} id(s). Ctrl-C to exit.", ids.len());
    wait_for_ctrl_c()?;
    listener.stop()?;
    Ok(())
}

fn print_notification(callback: Callback) -> onem2m::Result<NotificationReply> {
    match callback {
        Callback::Notification(notification) => {
            tracing::info!(sur = %notification.sur, event = ?notification.event_type(), "Notification");
            if let Some(rep) = notification.representation() {
                println!("{}", serde_json::to_string_pretty(rep)?);
            }
        },
        Callback::Response(response) => println!("{response}"),
        Callback::Empty => {},
    }
    Ok(NotificationReply::ok())
}

fn wait_for_ctrl_c() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tokio::signal::ctrl_c())?;
    Ok(())
}

fn print_response(response: &OneM2MResponse) {
    println!("rsc: {}", response.rsc);
    println!("rqi: {}", response.rqi);
    if let Some(location) = response.param("cn") {
        println!("location: {location}");
    }
    if let Some(pc) = &response.pc {
        match serde_json::to_string_pretty(pc) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{pc}"),
        }
    }
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
