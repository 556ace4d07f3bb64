//! User bootstrap command
//!
//! `POST /users` needs an existing administrator, so the first one is
//! created from the command line.

use feedback_core::{
    auth::Authenticator, config::AppConfig, error::Result, storage::ReportStorage,
    types::UserCreate, FeedbackError,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Create a user, prompting for the password on stdin when not supplied
pub async fn handle(
    config: &AppConfig,
    username: String,
    full_name: Option<String>,
    is_admin: bool,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password(&username)?,
    };

    let storage: Arc<dyn ReportStorage> = Arc::new(super::open_storage(config).await?);
    let auth = Authenticator::from_config(storage, config)?;

    let user = auth
        .register(&UserCreate {
            username,
            password,
            full_name,
            is_admin,
        })
        .await?;

    println!(
        "Created user '{}' (id: {}, admin: {})",
        user.username, user.id, user.is_admin
    );
    Ok(())
}

fn prompt_password(username: &str) -> Result<String> {
    eprint!("Password for '{}': ", username);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();

    if password.is_empty() {
        return Err(FeedbackError::Validation(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(password)
}
