use anyhow::{Result, bail};
use odocal_core::{HttpRpcClient, OdooError, Session};
use odocal_core::auth::authenticate;
use owo_colors::OwoColorize;

use crate::profile::Profile;

pub async fn run(
    url: &str,
    database: &str,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    if url.trim().is_empty()
        || database.trim().is_empty()
        || username.trim().is_empty()
        || password.is_empty()
    {
        bail!("All of url, database, username and password are required");
    }

    let url = Profile::normalize_url(url);
    let client = HttpRpcClient::new()?;
    let session = Session::new(&url, database, username, &password);

    match authenticate(&client, &session).await {
        Ok(uid) => {
            let profile = Profile {
                url,
                database: database.to_string(),
                username: username.to_string(),
                password,
            };
            profile.save()?;
            println!("{} (uid {})", "Logged in".green(), uid);
            println!("Run {} to fetch your calendar", "odocal sync".bold());
            Ok(())
        }
        // Each failure category gets its own wording; a wrong password
        // and an unreachable host need different user action.
        Err(OdooError::InvalidCredentials) => {
            bail!(
                "{}",
                "Authentication failed: check your database, username and password".red()
            )
        }
        Err(err @ OdooError::Unreachable(_)) => {
            bail!("{}\n  {err}", "Could not reach the server: check the URL and your connection".red())
        }
        Err(err @ OdooError::Timeout(_)) => {
            bail!("{}\n  {err}", "The server took too long to respond; try again".red())
        }
        Err(err @ OdooError::Tls(_)) => {
            bail!("{}\n  {err}", "Secure connection failed: make sure the instance uses HTTPS".red())
        }
        Err(err) => Err(err.into()),
    }
}
