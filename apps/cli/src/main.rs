use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vidzpro_core::{
    ApiClient, ApiService, AppConfig, AuthService, FileStore, VideoId, VideoPager, VidzproError,
    config::get_download_dir,
    library::download_certificate,
    types::{ChangePasswordRequest, UpdateProfileRequest},
};

mod render;
mod watch;

#[derive(Parser)]
#[command(name = "vidzpro")]
#[command(about = "Browse assigned training videos and watch them through to completion")]
struct Cli {
    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL. Overrides config.json and VIDZPRO_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the access token
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Ask the backend to send a password reset email
    ForgotPassword { email: String },
    /// Change the signed-in user's password (prompts for all three fields)
    ChangePassword,
    /// Show the signed-in user's profile
    Profile,
    /// Change the signed-in user's name and phone number
    UpdateProfile {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Show the purchased subscription plan
    Dashboard,
    /// List video categories
    Categories,
    /// List the videos of a category
    Videos {
        category: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Fetch every page instead of one
        #[arg(short, long)]
        all: bool,
    },
    /// Show a video's details and key points
    Video { id: u64 },
    /// Generate the completion certificate for a category type and save the PDF
    Certificate {
        category: String,
        /// Directory to save into (defaults to Documents/vidzpro)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Watch a video: reads player messages (JSON lines) and `:commands` from stdin
    Watch { id: u64 },
}

struct App {
    config: AppConfig,
    api: Arc<ApiClient>,
    store: Arc<FileStore>,
    auth: AuthService<ApiClient, FileStore>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn done(msg: impl std::fmt::Display) -> String {
    format!("{} {}", style("✓").green().bold(), msg)
}

fn prompt_secret(label: &str) -> Result<String> {
    let term = Term::stderr();
    term.write_str(&format!("{label}: "))?;
    Ok(term.read_secure_line()?)
}

async fn build_app(cli: &Cli) -> Result<App> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }

    let api = Arc::new(ApiClient::new(&config.api)?);
    let store = Arc::new(FileStore::new(config.store_path()));
    let auth = AuthService::new(Arc::clone(&api), Arc::clone(&store));
    let signed_in = auth.restore().await;
    debug!(signed_in, store = %store.path().display(), "client ready");

    Ok(App {
        config,
        api,
        store,
        auth,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let app = build_app(&cli).await?;

    match cli.command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_secret("Password")?,
            };
            let spinner = create_spinner("Signing in...");
            let result = app.auth.login(&email, &password).await;
            spinner.finish_and_clear();
            let data = result?;
            println!(
                "{}",
                done(format!(
                    "Signed in as {} {}",
                    style(&data.name).bold(),
                    style(format!("<{}>", data.email)).dim()
                ))
            );
        }
        Command::Logout => {
            app.auth.logout().await?;
            println!("{}", done("Signed out"));
        }
        Command::ForgotPassword { email } => {
            let message = app.auth.forgot_password(&email).await?;
            println!("{}", done(message));
        }
        Command::ChangePassword => {
            let request = ChangePasswordRequest {
                current_password: prompt_secret("Current password")?,
                new_password: prompt_secret("New password")?,
                confirm_password: prompt_secret("Confirm new password")?,
            };
            let message = app.auth.change_password(&request).await?;
            println!("{}", done(message));
        }
        Command::Profile => {
            let profile = app.api.user_details().await?;
            render::profile(&profile);
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            phone,
        } => {
            let request = UpdateProfileRequest {
                first_name,
                last_name,
                phone,
            };
            let updated = app.auth.update_profile(&request).await?;
            println!("{}", done(format!("Profile updated for {}", updated.name)));
        }
        Command::Dashboard => {
            let spinner = create_spinner("Loading plan...");
            let plan = app.api.purchased_plan().await;
            spinner.finish_and_clear();
            render::plan(&plan?);
        }
        Command::Categories => {
            let categories = app.api.video_categories().await?;
            render::categories(&categories);
        }
        Command::Videos {
            category,
            page,
            all,
        } => {
            if all {
                let spinner = create_spinner(&format!("Fetching {category} videos..."));
                let mut pager = VideoPager::new(Arc::clone(&app.api), category.as_str());
                let videos = pager.collect_all().await;
                spinner.finish_and_clear();
                render::videos(&videos?, None);
            } else {
                let page = app.api.videos_by_category(&category, page).await?;
                render::videos(&page.data, Some((page.current_page, page.last_page)));
            }
        }
        Command::Video { id } => {
            let detail = app.api.video_detail(VideoId(id)).await?;
            render::detail(&detail);
        }
        Command::Certificate { category, out } => {
            let dir = out.unwrap_or_else(get_download_dir);
            let spinner = create_spinner("Generating certificate...");
            let saved = download_certificate(&*app.api, &category, &dir).await;
            spinner.finish_and_clear();
            let saved = saved?;
            println!("{}", done(&saved.message));
            println!(
                "  {} certificate saved to {}",
                saved.kind.label(),
                style(saved.path.display()).cyan()
            );
        }
        Command::Watch { id } => {
            watch::run(app.api, app.store, VideoId(id), &app.config.gate).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        if e
            .downcast_ref::<VidzproError>()
            .is_some_and(VidzproError::requires_reauth)
        {
            eprintln!(
                "{}",
                style("Sign in again with `vidzpro login <email>`.").dim()
            );
        }
        std::process::exit(1);
    }
}
