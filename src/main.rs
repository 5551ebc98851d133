use anyhow::Result;
use dialoguer::{Input, Password};
use std::sync::Arc;

use chokai_admin::api::{ExamClient, ProfileClient};
use chokai_admin::auth::{SessionClient, SqliteStore};
use chokai_admin::config::{Command, Config, ExamCommand};
use chokai_admin::gateway::{AuthGateway, SessionNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let store = Arc::new(SqliteStore::open(&config.credentials_file)?);

    let on_session_expired: SessionNotifier = Arc::new(|| {
        eprintln!("Session expired. Please run `chokai-admin login` again.");
    });

    let gateway = Arc::new(AuthGateway::new(
        &config.api_url,
        config.connect_timeout,
        config.request_timeout,
        store,
        on_session_expired,
    )?);

    match command {
        Command::Login { email } => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email").interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;

            let session = SessionClient::new(gateway.clone());
            session.login(&email, &password).await?;

            let me = ProfileClient::new(gateway).me().await?;
            println!("Logged in as {} ({})", me.username, me.email);
        }

        Command::Logout => {
            SessionClient::new(gateway).logout();
            println!("Logged out.");
        }

        Command::Whoami => {
            let me = ProfileClient::new(gateway).me().await?;
            println!("{} <{}>", me.username, me.email);
            println!("  role:     {}", me.role.as_str());
            println!("  active:   {}", me.is_active);
            println!("  verified: {}", me.email_verified);
            if let Some(locked_until) = me.locked_until {
                println!("  locked until {}", locked_until.to_rfc3339());
            }
        }

        Command::Exams { command } => match command {
            ExamCommand::List => {
                let listing = ExamClient::new(gateway).list_exams().await?;
                println!(
                    "{} exam(s), page {}/{}",
                    listing.total, listing.page, listing.total_pages
                );
                for exam in listing.exams {
                    let state = if exam.is_published { "published" } else { "draft" };
                    println!("  {}  [{}]  {}", exam.exam_id, state, exam.title);
                }
            }
        },
    }

    Ok(())
}
