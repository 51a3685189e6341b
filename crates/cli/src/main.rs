mod config;
mod error;

use std::path::PathBuf;

use chrono::{Local, TimeZone};
use clap::{ArgAction, Parser, Subcommand};
use policy::{Capability, Decision, PolicyConfig, PolicyMap, PolicyValue, Query, Viewer};
use storage::{ObjectId, ObjectStore, StoredObject};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "warden.toml";

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Policy-aware object visibility", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Let logged-out viewers see public objects, even if the config file
    /// disables it
    #[arg(long, global = true, env = "WARDEN_ALLOW_PUBLIC", action = ArgAction::SetTrue)]
    allow_public: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new object
    Add {
        #[arg(short, long)]
        title: String,
        /// Owner user name; owners hold every capability that has a policy
        #[arg(short, long)]
        owner: Option<String>,
        /// Policy assignment such as view=users (repeatable)
        #[arg(short, long = "policy")]
        policies: Vec<String>,
    },
    /// List the objects a viewer can see
    List {
        /// Viewer: public, user:NAME, admin:NAME or omnipotent
        #[arg(long = "as", default_value = "public")]
        viewer: Viewer,
        /// Maximum number of results (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Number of visible results to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,
        /// Capabilities the viewer must hold
        #[arg(short, long, value_delimiter = ',', default_value = "view")]
        require: Vec<Capability>,
    },
    /// Show one object if the viewer can see it
    Show {
        id: String,
        #[arg(long = "as", default_value = "public")]
        viewer: Viewer,
    },
    /// Change the policy of one capability
    SetPolicy {
        id: String,
        capability: Capability,
        policy: String,
    },
    /// Delete an object
    Remove { id: String },
    /// List the global policy tiers
    Policies,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;
    let policy_config = PolicyConfig {
        allow_public: cli.allow_public || config.policy.allow_public,
    };
    let store = open_store(&config)?;
    tracing::debug!(allow_public = policy_config.allow_public, "loaded configuration");

    match cli.command {
        Commands::Add {
            title,
            owner,
            policies,
        } => cmd_add(&store, title, owner, &policies),
        Commands::List {
            viewer,
            limit,
            offset,
            require,
        } => cmd_list(&store, policy_config, viewer, limit, offset, require),
        Commands::Show { id, viewer } => cmd_show(&store, policy_config, &id, viewer),
        Commands::SetPolicy {
            id,
            capability,
            policy,
        } => cmd_set_policy(&store, &id, capability, &policy),
        Commands::Remove { id } => cmd_remove(&store, &id),
        Commands::Policies => {
            cmd_policies(policy_config);
            Ok(())
        }
    }
}

fn cmd_add(
    store: &ObjectStore,
    title: String,
    owner: Option<String>,
    assignments: &[String],
) -> Result<()> {
    let policies = if assignments.is_empty() {
        PolicyMap::new()
            .with(Capability::View, PolicyValue::User)
            .with(Capability::Edit, PolicyValue::User)
    } else {
        parse_assignments(assignments)?
    };

    let mut object = StoredObject::new(title, policies);
    if let Some(owner) = owner {
        object = object.with_owner(owner);
    }
    store.insert(&object)?;

    println!("{}", object.id);
    Ok(())
}

fn cmd_list(
    store: &ObjectStore,
    config: PolicyConfig,
    viewer: Viewer,
    limit: usize,
    offset: usize,
    require: Vec<Capability>,
) -> Result<()> {
    let objects = Query::new(viewer)
        .with_config(config)
        .with_candidates(store.list()?)
        .require_capabilities(require)
        .with_limit(limit)
        .with_offset(offset)
        .execute();

    if objects.is_empty() {
        println!("No visible objects.");
        return Ok(());
    }

    println!("{:<36}  {:<16}  {:<24}  POLICIES", "OBJECT ID", "CREATED", "TITLE");
    println!("{}", "-".repeat(100));

    for object in objects {
        let created = Local
            .from_utc_datetime(&object.created_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        println!(
            "{:<36}  {:<16}  {:<24}  {}",
            object.id,
            created,
            object.title,
            format_policies(&object.policies)
        );
    }

    Ok(())
}

fn cmd_show(store: &ObjectStore, config: PolicyConfig, id: &str, viewer: Viewer) -> Result<()> {
    let object_id = parse_id(id)?;
    let candidate = store.get(object_id)?.ok_or_else(|| Error::ObjectNotFound {
        id: id.to_string(),
    })?;

    let object = Query::new(viewer.clone())
        .with_config(config)
        .with_candidates([candidate])
        .execute_one()?
        .ok_or_else(|| Error::ObjectNotFound { id: id.to_string() })?;

    println!("Object:  {}", object.id);
    println!("Title:   {}", object.title);
    if let Some(owner) = &object.owner {
        println!("Owner:   {owner}");
    }
    println!(
        "Created: {}",
        Local
            .from_utc_datetime(&object.created_at.naive_utc())
            .format("%Y-%m-%d %H:%M:%S")
    );
    println!("\nCapabilities for {viewer}:");

    for (capability, value) in object.policies.iter() {
        let verdict = match policy::check(&viewer, &object, &[capability], &config) {
            Decision::Allow => "allowed".to_string(),
            Decision::Deny(rejection) => format!("denied ({})", rejection.reason),
        };
        println!("  {:<6} {:<28} {verdict}", capability.as_str(), value.name());
    }

    Ok(())
}

fn cmd_set_policy(
    store: &ObjectStore,
    id: &str,
    capability: Capability,
    policy: &str,
) -> Result<()> {
    let object_id = parse_id(id)?;
    let value = PolicyValue::parse(policy);
    if !value.is_recognized() {
        tracing::warn!(policy, "unrecognized policy; only omnipotent viewers will pass");
    }

    store
        .set_policy(object_id, capability, value)
        .map_err(|e| match e {
            storage::Error::NotFound(_) => Error::ObjectNotFound { id: id.to_string() },
            other => other.into(),
        })
}

fn cmd_remove(store: &ObjectStore, id: &str) -> Result<()> {
    if !store.delete(parse_id(id)?)? {
        return Err(Error::ObjectNotFound { id: id.to_string() });
    }
    println!("Removed {id}");
    Ok(())
}

fn cmd_policies(config: PolicyConfig) {
    println!("{:<8}  {:<28}  LOGGED-OUT ACCESS", "POLICY", "NAME");
    for tier in PolicyValue::GLOBAL {
        let logged_out = match tier {
            PolicyValue::Public if config.allow_public => "yes",
            _ => "no",
        };
        println!("{:<8}  {:<28}  {logged_out}", tier.as_str(), tier.name());
    }
}

fn parse_id(id: &str) -> Result<ObjectId> {
    id.parse().map_err(|_| Error::InvalidId { id: id.to_string() })
}

/// Parse repeated `capability=policy` arguments.
fn parse_assignments(assignments: &[String]) -> Result<PolicyMap> {
    let pairs = assignments
        .iter()
        .map(|a| {
            a.split_once('=')
                .filter(|(c, p)| !c.is_empty() && !p.is_empty())
                .ok_or_else(|| Error::InvalidAssignment(a.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PolicyMap::from_pairs(pairs)?)
}

fn format_policies(policies: &PolicyMap) -> String {
    policies
        .iter()
        .map(|(capability, policy)| format!("{capability}={policy}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn open_store(config: &Config) -> Result<ObjectStore> {
    let db_path = match &config.storage.path {
        Some(path) => path.clone(),
        None => {
            let data_dir = dirs_data_dir().unwrap_or_else(|| ".warden".into());
            std::fs::create_dir_all(&data_dir)?;
            data_dir.join("objects.db")
        }
    };

    tracing::debug!(path = %db_path.display(), "opening object store");
    Ok(ObjectStore::open(&db_path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/warden"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("warden"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("warden"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
