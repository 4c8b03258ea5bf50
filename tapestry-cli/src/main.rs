//! Command-line interface for the Tapestry schema sync engine

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use tapestry_cli::api::TapestryClient;
use tapestry_cli::config::Config;
use tapestry_cli::schema::{
    load_manifest, to_camel_case, Manifest, ManifestContentType, ManifestField,
};
use tapestry_cli::sync::{
    report, ReferenceLookups, RemoteContentType, SchemaRemote, SyncEngine, SyncOptions,
    SyncOutcome,
};

#[derive(Parser)]
#[command(
    name = "tapestry-cli",
    version,
    about = "Keep a declared content schema in sync with a Tapestry backend"
)]
struct Cli {
    /// Environment name from the config file
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SyncArgs {
    /// Path to the schema manifest
    #[arg(long, default_value = "tapestry.toml")]
    schema: std::path::PathBuf,

    /// Do not create missing content types
    #[arg(long)]
    no_create: bool,

    /// Do not create missing fields
    #[arg(long)]
    no_create_fields: bool,

    /// Do not update divergent fields
    #[arg(long)]
    no_update_fields: bool,

    /// Delete remote fields with no declared counterpart
    #[arg(long)]
    delete_extra_fields: bool,

    /// Emit the action list as JSON instead of the report
    #[arg(long)]
    json: bool,
}

impl SyncArgs {
    fn options(&self, dry_run: bool) -> SyncOptions {
        SyncOptions {
            dry_run,
            create_missing: !self.no_create,
            create_missing_fields: !self.no_create_fields,
            update_fields: !self.no_update_fields,
            delete_extra_fields: self.delete_extra_fields,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compute and print the action plan without touching the backend
    Plan {
        #[command(flatten)]
        args: SyncArgs,

        /// Exit non-zero when the plan contains pending changes
        #[arg(long)]
        check: bool,
    },
    /// Apply the plan to the backend
    Apply {
        #[command(flatten)]
        args: SyncArgs,
    },
    /// Print the remote schema as a manifest skeleton
    Pull,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load()?;
    let environment = config.environment(cli.env.as_deref())?;
    let client = TapestryClient::new(environment);

    match cli.command {
        Command::Plan { args, check } => {
            let outcome = run_sync(&client, &args, true).await?;
            if check && outcome.has_changes() {
                std::process::exit(1);
            }
        }
        Command::Apply { args } => {
            let outcome = run_sync(&client, &args, false).await?;
            if outcome.summary().errors > 0 {
                std::process::exit(1);
            }
        }
        Command::Pull => {
            let observed = client.inspect().await?;
            print!("{}", toml::to_string_pretty(&manifest_from_observed(&observed))?);
        }
    }

    Ok(())
}

async fn run_sync(client: &TapestryClient, args: &SyncArgs, dry_run: bool) -> Result<SyncOutcome> {
    let desired = load_manifest(&args.schema)?;
    let engine = SyncEngine::new(client, args.options(dry_run));
    let outcome = engine.sync(&desired).await?;

    if args.json {
        println!("{}", report::render_json(&outcome)?);
    } else {
        print!("{}", report::render(&outcome, dry_run));
    }
    Ok(outcome)
}

/// Render the observed remote schema as an authorable manifest, field keys
/// converted back to camelCase and reference identifiers back to names.
fn manifest_from_observed(observed: &[RemoteContentType]) -> Manifest {
    let lookups = ReferenceLookups::build(observed);
    let mut manifest = Manifest::default();

    for content_type in observed {
        let mut entry = ManifestContentType::default();
        for field in content_type.fields.values() {
            let references = if field.reference_type_ids.is_empty() {
                None
            } else {
                Some(
                    field
                        .reference_type_ids
                        .iter()
                        .map(|id| lookups.name_of(id).unwrap_or(id).to_string())
                        .collect(),
                )
            };
            entry.fields.insert(
                to_camel_case(&field.name),
                ManifestField {
                    field_type: field.field_type.as_str().to_string(),
                    required: field.required,
                    is_label: field.is_label,
                    options: field.options.clone(),
                    references,
                    description: None,
                },
            );
        }
        manifest.content_type.insert(content_type.name.clone(), entry);
    }

    manifest
}
