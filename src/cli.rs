//! Command surface for the dashboard: clap parsing, session handling and
//! wiring of the provider, classifier and state machine.
//!
//! All behaviour lives in the library modules; this module only routes
//! subcommands and renders results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::contract::{AnalysisMode, Classifier, HierarchyProvider, SessionStore};
use crate::dashboard::Dashboard;
use crate::gemini::GeminiClient;
use crate::mock_drive::MockDrive;
use crate::render;
use crate::session::{FileSessionStore, DEMO_USER};

/// CLI for drive-optima: AI-assisted reorganisation plans for your drive.
#[derive(Parser)]
#[clap(
    name = "drive-optima",
    version,
    about = "Analyze a drive hierarchy with an AI classifier and apply selected recommendations"
)]
pub struct Cli {
    /// Optional YAML file with non-secret settings
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enter demo mode as the demo user
    Login,
    /// Sign out and forget the stored identity
    Logout,
    /// Show the login screen or the dashboard overview
    Status,
    /// Show the file-type distribution of the drive
    Stats,
    /// Run an analysis and optionally apply recommendations
    Analyze {
        /// Quick weekly sync focused on recent items instead of a deep scan
        #[clap(long)]
        weekly: bool,

        /// Remove a recommendation from the selection (repeatable)
        #[clap(long, value_name = "ID")]
        deselect: Vec<String>,

        /// Apply a single RENAME recommendation immediately (repeatable)
        #[clap(long = "quick-rename", value_name = "ID")]
        quick_rename: Vec<String>,

        /// Apply every selected recommendation
        #[clap(long)]
        apply: bool,

        /// Print the raw report as JSON instead of the dashboard view
        #[clap(long)]
        json: bool,
    },
}

fn load_app_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => AppConfig::load(p)?,
        None => AppConfig::from_env()?,
    };
    config.trace_loaded();
    Ok(config)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_app_config(cli.config)?;
    let open_store = || FileSessionStore::open(config.storage_dir.as_deref());
    let provider = MockDrive;

    match cli.command {
        Commands::Login => {
            open_store()?.save_user(DEMO_USER)?;
            tracing::info!(command = "login", user = DEMO_USER, "Signed in");
            println!("Signed in as {DEMO_USER}");
            Ok(())
        }
        Commands::Logout => {
            open_store()?.clear_user()?;
            tracing::info!(command = "logout", "Signed out");
            println!("Signed out.");
            Ok(())
        }
        Commands::Status => {
            let hierarchy = load_hierarchy(&provider).await?;
            match open_store()?.load_user()? {
                Some(user) => {
                    let mut view = render::header_view(&user);
                    view.push('\n');
                    view.push_str(&render::distribution_view(
                        &crate::distribution::file_type_distribution(&hierarchy),
                    ));
                    print!("{view}");
                }
                None => print!("{}", render::login_view()),
            }
            Ok(())
        }
        Commands::Stats => {
            let hierarchy = load_hierarchy(&provider).await?;
            let counts = crate::distribution::file_type_distribution(&hierarchy);
            print!("{}", render::distribution_view(&counts));
            Ok(())
        }
        Commands::Analyze {
            weekly,
            deselect,
            quick_rename,
            apply,
            json,
        } => {
            let user = open_store()?
                .load_user()?
                .context("Not signed in. Run `drive-optima login` first.")?;
            let hierarchy = load_hierarchy(&provider).await?;
            let classifier = GeminiClient::new(config.classifier.clone())
                .context("Failed to construct classifier client")?;
            let mode = if weekly {
                AnalysisMode::Weekly
            } else {
                AnalysisMode::Deep
            };
            let mut dashboard = Dashboard::new(classifier, hierarchy, config.apply_delay);
            dashboard.sign_in(user);
            analyze(&mut dashboard, mode, &deselect, &quick_rename, apply, json).await
        }
    }
}

async fn load_hierarchy<P: HierarchyProvider>(provider: &P) -> Result<crate::model::Hierarchy> {
    let hierarchy = provider.load().await?;
    hierarchy.validate()?;
    Ok(hierarchy)
}

/// Runs one analysis through the dashboard and renders the outcome.
pub async fn analyze<C: Classifier>(
    dashboard: &mut Dashboard<C>,
    mode: AnalysisMode,
    deselect: &[String],
    quick_rename: &[String],
    apply: bool,
    json: bool,
) -> Result<()> {
    tracing::info!(command = "analyze", %mode, "Starting analysis");
    if let Err(e) = dashboard.run_analysis(mode).await {
        tracing::error!(command = "analyze", error = %e, "Analysis failed");
        eprint!("{}", render::dashboard_view(dashboard.state()));
        return Err(anyhow::Error::new(e).context("Failed to analyze drive"));
    }

    for id in deselect {
        dashboard.toggle(id.clone());
    }
    for id in quick_rename {
        dashboard.quick_apply(id.clone());
    }
    if apply && !dashboard.apply_selected().await {
        tracing::warn!(command = "analyze", "Nothing selected to apply");
    }

    if json {
        let report = dashboard
            .state()
            .report()
            .context("Analysis finished without a report")?;
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render::dashboard_view(dashboard.state()));
    }
    Ok(())
}
