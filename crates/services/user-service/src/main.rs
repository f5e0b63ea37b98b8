//! User Service - command-line access to user records.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

use domain::{
    FilterOptions, Gender, ProfilePicture, SortField, SortOrder, UserFormData, DOB_FORMAT,
};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::service::PictureCleanup;
use user_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "Manage user records and profile pictures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    dob: String,
    /// male, female, other or unspecified
    #[arg(long)]
    gender: Option<Gender>,
    /// Image file to upload as the profile picture
    #[arg(long)]
    picture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user
    Add(ProfileArgs),
    /// List users as JSON
    List {
        /// name, email, dob, gender, createdAt or updatedAt
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
        /// Name prefix
        #[arg(long)]
        name: Option<String>,
        /// Email prefix
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        gender: Option<Gender>,
    },
    /// Replace a user's profile fields
    Update {
        id: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Delete a user and its profile picture
    Delete { id: String },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => domain::DEFAULT_CONTENT_TYPE,
    }
}

async fn read_form(args: ProfileArgs) -> Result<UserFormData, Box<dyn std::error::Error>> {
    let mut form = UserFormData::new(
        args.name,
        args.email,
        args.dob,
        args.gender.unwrap_or_default(),
    );

    form.validate()?;
    NaiveDate::parse_from_str(&form.dob, DOB_FORMAT)
        .map_err(|e| format!("Invalid date of birth {:?}: {}", form.dob, e))?;

    if let Some(path) = args.picture {
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        form = form.with_picture(
            ProfilePicture::new(file_name, bytes).with_content_type(guess_content_type(&path)),
        );
    }

    Ok(form)
}

fn report_cleanup(cleanup: &PictureCleanup) {
    if let PictureCleanup::Failed { location, reason } = cleanup {
        warn!("Previous profile picture {} was not removed: {}", location, reason);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(user_service_lib::log_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = UserServiceConfig::from_env()?;

    match cli.command {
        Commands::Add(profile) => {
            let form = read_form(profile).await?;
            let service = user_service_lib::build_service(&config).await?;
            let id = service.add_user(form).await?;
            println!("{}", id);
        }
        Commands::List {
            sort,
            order,
            name,
            email,
            gender,
        } => {
            let filters = FilterOptions {
                name,
                email,
                gender,
                ..Default::default()
            };
            let service = user_service_lib::build_service(&config).await?;
            let users = service.get_users(sort, order, &filters).await?;
            println!("{}", serde_json::to_string_pretty(&users)?);
        }
        Commands::Update { id, profile } => {
            let form = read_form(profile).await?;
            let service = user_service_lib::build_service(&config).await?;
            let current = service.get_user(&id).await?;
            let cleanup = service
                .update_user(&id, form, current.profilepicture.as_deref())
                .await?;
            report_cleanup(&cleanup);
        }
        Commands::Delete { id } => {
            let service = user_service_lib::build_service(&config).await?;
            let current = service.get_user(&id).await?;
            let cleanup = service
                .delete_user(&id, current.profilepicture.as_deref())
                .await?;
            report_cleanup(&cleanup);
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            user_service_lib::run_migrations(&config, migrate_action).await?;
        }
    }

    Ok(())
}
