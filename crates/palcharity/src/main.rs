//! `palcharity` - CLI for the donation ledger
//!
//! This binary provides the command-line interface for managing profiles and
//! projects, recording donations, and reading donation statistics.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use palcharity::cli::{
    AssociationCommand, Cli, Command, ConfigCommand, DonateCommand, DonorCommand, HistoryCommand,
    OutputFormat, ProjectAddCommand, ProjectCommand, StatsCommand,
};
use palcharity::{
    init_logging, parse_amount, Association, Category, Config, Donation, DonationRequest, Donor,
    GeoPoint, Ledger, NewProject, Project, ProjectCatalog, SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Status(status_cmd) => handle_status(&config, cli.memory, status_cmd.json),
        Command::Classify(classify_cmd) => {
            println!("{}", classify_cmd.category());
            Ok(())
        }
        command => {
            let ledger = if cli.memory {
                Ledger::in_memory(&config)
            } else {
                Ledger::open(&config).with_context(|| {
                    format!("opening ledger at {}", config.database_path().display())
                })?
            };
            run(&ledger, command).await
        }
    }
}

async fn run(ledger: &Ledger, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Donor(cmd) => handle_donor(ledger, cmd).await,
        Command::Association(cmd) => handle_association(ledger, cmd).await,
        Command::Project(cmd) => handle_project(ledger, cmd).await,
        Command::Donate(cmd) => handle_donate(ledger, cmd).await,
        Command::Stats(cmd) => handle_stats(ledger, cmd).await,
        Command::History(cmd) => handle_history(ledger, &cmd).await,
        Command::Config(_) | Command::Status(_) | Command::Classify(_) => Ok(()),
    }
}

async fn handle_donor(ledger: &Ledger, cmd: DonorCommand) -> anyhow::Result<()> {
    let donors = ledger.donors();
    match cmd {
        DonorCommand::Create {
            uid,
            first_name,
            last_name,
            email,
        } => {
            let donor = Donor {
                id: uid,
                first_name,
                last_name,
                email,
            };
            donors.create(&donor).await?;
            println!("Saved donor {}", donor.id);
        }
        DonorCommand::Show { uid, json } => {
            let donor = donors.get(&uid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&donor)?);
            } else {
                println!("Donor {}", donor.id);
                println!("  Name:   {}", donor.display_name());
                println!("  Email:  {}", donor.email);
            }
        }
        DonorCommand::Update { uid, fields } => {
            let donor = donors.update(&uid, &fields.into()).await?;
            println!("Updated donor {} ({})", donor.id, donor.display_name());
        }
        DonorCommand::Exists { uid } => {
            let presence = donors.exists(&uid).await?;
            println!("{}", if presence.is_present() { "present" } else { "absent" });
        }
    }
    Ok(())
}

async fn handle_association(ledger: &Ledger, cmd: AssociationCommand) -> anyhow::Result<()> {
    let associations = ledger.associations();
    match cmd {
        AssociationCommand::Create { uid, name, email } => {
            let association = Association {
                id: uid,
                name,
                email,
            };
            associations.create(&association).await?;
            println!("Saved association {}", association.id);
        }
        AssociationCommand::Show { uid, json } => {
            let association = associations.get(&uid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&association)?);
            } else {
                println!("Association {}", association.id);
                println!("  Name:   {}", association.name);
                println!("  Email:  {}", association.email);
            }
        }
        AssociationCommand::Update { uid, name, email } => {
            let update = AssociationCommand::update_fields(name, email);
            let association = associations.update(&uid, &update).await?;
            println!("Updated association {} ({})", association.id, association.name);
        }
        AssociationCommand::Exists { uid } => {
            let presence = associations.exists(&uid).await?;
            println!("{}", if presence.is_present() { "present" } else { "absent" });
        }
    }
    Ok(())
}

async fn handle_project(ledger: &Ledger, cmd: ProjectCommand) -> anyhow::Result<()> {
    let catalog = ledger.projects();
    match cmd {
        ProjectCommand::Add(add) => {
            let project = catalog.add(&new_project(add)?).await?;
            println!("Created project {} ({})", project.id, project.title);
        }
        ProjectCommand::List {
            association,
            category,
            all,
            format,
        } => {
            let mut projects = match &association {
                Some(name) => catalog.list_by_association(name).await?,
                None if all => catalog.list_all().await?,
                None => catalog.list_open().await?,
            };
            if association.is_some() && !all {
                projects.retain(Project::is_open);
            }
            if let Some(text) = &category {
                projects = ProjectCatalog::filter_by_category(projects, text);
            }
            print_projects(&projects, format)?;
        }
        ProjectCommand::Show { id, json } => {
            let project = catalog.get(&id).await?;
            let summary = ledger.stats().project_summary(&project).await?;
            if json {
                let value = serde_json::json!({ "project": project, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} [{}]", project.title, project.category);
                println!("  Id:           {}", project.id);
                println!("  Association:  {}", project.association_name);
                println!("  Description:  {}", project.description);
                println!("  Image:        {}", project.image_url);
                println!(
                    "  Remaining:    {} of {} ({}% funded)",
                    project.amount_remaining, project.amount_needed, summary.funded_percent
                );
                println!(
                    "  Donations:    {} from {} donor(s), {} in money",
                    summary.donation_count, summary.distinct_donors, summary.amount_donated
                );
            }
        }
        ProjectCommand::Delete { id } => {
            if catalog.delete(&id).await? {
                println!("Deleted project {id}");
            } else {
                bail!("project not found: {id}");
            }
        }
    }
    Ok(())
}

fn new_project(add: ProjectAddCommand) -> anyhow::Result<NewProject> {
    Ok(NewProject {
        title: add.title,
        description: add.description,
        amount_needed: parse_amount(&add.amount_needed)?,
        association_name: add.association,
        category: add.category.into(),
        image_url: add.image,
    })
}

async fn handle_donate(ledger: &Ledger, cmd: DonateCommand) -> anyhow::Result<()> {
    let category = Category::from(cmd.category);
    let mut request = if category.is_monetary() {
        let amount = parse_amount(cmd.amount.as_deref().unwrap_or_default())?;
        DonationRequest::money(cmd.donor, amount)
    } else {
        if cmd.amount.is_some() {
            tracing::warn!(%category, "Ignoring amount for an in-kind donation");
        }
        DonationRequest::in_kind(cmd.donor, category)
    };
    if let (Some(lat), Some(lng)) = (cmd.lat, cmd.lng) {
        request = request.at(GeoPoint::new(lat, lng)?);
    }

    let recorded = ledger.recorder().donate_to(&cmd.project, &request).await?;
    let id = recorded.donation.id.as_deref().unwrap_or("-");
    match recorded.remaining {
        Some(remaining) => println!(
            "Recorded donation {id}: {} {} to \"{}\" ({remaining} remaining)",
            recorded.donation.amount, category, recorded.donation.project_title
        ),
        None => println!(
            "Recorded donation {id}: {} to \"{}\"",
            category, recorded.donation.project_title
        ),
    }
    Ok(())
}

async fn handle_stats(ledger: &Ledger, cmd: StatsCommand) -> anyhow::Result<()> {
    let stats = ledger.stats();
    match cmd {
        StatsCommand::Donor { uid, json } => {
            let summary = stats.donor_stats(&uid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Donor {uid}");
                println!("  Donations:        {}", summary.donation_count);
                println!("  Total given:      {}", summary.total_amount);
                for category in Category::ALL {
                    println!(
                        "  {:<17} {}",
                        format!("{category}:"),
                        summary.count_for(category)
                    );
                }
                println!("  Projects:         {}", summary.unique_projects);
            }
        }
        StatsCommand::Project { id, json } => {
            let project = ledger.projects().get(&id).await?;
            let summary = stats.project_summary(&project).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Project {} ({})", project.id, project.title);
                println!("  Donations:        {}", summary.donation_count);
                println!("  Distinct donors:  {}", summary.distinct_donors);
                println!("  Money donated:    {}", summary.amount_donated);
                println!("  Funded:           {}%", summary.funded_percent);
            }
        }
    }
    Ok(())
}

async fn handle_history(ledger: &Ledger, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let history = ledger.stats().donor_history(&cmd.donor).await?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
        OutputFormat::Table => {
            println!(
                "{:<20} {:<8} {:>8}  {:<30} {}",
                "WHEN", "TYPE", "AMOUNT", "PROJECT", "ASSOCIATION"
            );
            for donation in &history {
                println!(
                    "{:<20} {:<8} {:>8}  {:<30} {}",
                    donation.recorded_at().format("%Y-%m-%d %H:%M:%S"),
                    donation.category,
                    donation.amount,
                    truncate(&donation.project_title, 30),
                    donation.association_name
                );
            }
        }
        OutputFormat::Plain => {
            if history.is_empty() {
                println!("No donations for {}", cmd.donor);
            }
            for donation in &history {
                println!("{}", describe(donation));
            }
        }
    }
    Ok(())
}

fn describe(donation: &Donation) -> String {
    let what = if donation.category.is_monetary() {
        format!("{} money", donation.amount)
    } else {
        donation.category.to_string()
    };
    format!(
        "{}  {} to \"{}\" ({})",
        donation.recorded_at().to_rfc3339(),
        what,
        donation.project_title,
        donation.association_name
    )
}

fn print_projects(projects: &[Project], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(projects)?),
        OutputFormat::Plain => {
            for project in projects {
                println!(
                    "{}  {} [{}] {}/{}",
                    project.id,
                    project.title,
                    project.category,
                    project.amount_remaining,
                    project.amount_needed
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<32}  {:<30} {:<8} {:>10} {:>10}  {}",
                "ID", "TITLE", "TYPE", "REMAINING", "NEEDED", "ASSOCIATION"
            );
            for project in projects {
                println!(
                    "{:<32}  {:<30} {:<8} {:>10} {:>10}  {}",
                    project.id,
                    truncate(&project.title, 30),
                    project.category,
                    project.amount_remaining,
                    project.amount_needed,
                    project.association_name
                );
            }
        }
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn handle_status(config: &Config, memory: bool, json: bool) -> anyhow::Result<()> {
    if memory {
        if json {
            let status = serde_json::json!({ "backend": "memory" });
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Store: memory (nothing is persisted)");
        }
        return Ok(());
    }

    let store = SqliteStore::open(config.database_path(), config.busy_timeout())?;
    let stats = store.stats()?;
    if json {
        let status = serde_json::json!({
            "backend": "sqlite",
            "database_path": store.path(),
            "donors": stats.donors,
            "associations": stats.associations,
            "projects": stats.projects,
            "donations": stats.donations,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("palcharity status");
        println!("-----------------");
        println!("Database:      {}", store.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Donors:        {}", stats.donors);
        println!("Associations:  {}", stats.associations);
        println!("Projects:      {}", stats.projects);
        println!("Donations:     {}", stats.donations);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Donations]");
                match config.max_amount() {
                    Some(max) => println!("  Max amount:         {max}"),
                    None => println!("  Max amount:         unlimited"),
                }
                println!("  Default image:      {}", config.donations.default_image);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
