//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! saleso login -e seller@example.com
//! saleso whoami
//! saleso logout
//! ```

use std::io::BufRead;

use secrecy::SecretString;

use super::{CliError, client};

/// Sign in and persist the session.
#[allow(clippy::print_stdout)]
pub async fn login(email: &str, password: Option<String>) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let user = client()?
        .login(email, &SecretString::from(password))
        .await?;
    println!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

/// Clear the stored session.
#[allow(clippy::print_stdout)]
pub async fn logout() -> Result<(), CliError> {
    client()?.logout().await?;
    println!("Logged out");
    Ok(())
}

/// Print the signed-in user.
#[allow(clippy::print_stdout)]
pub async fn whoami(remote: bool) -> Result<(), CliError> {
    let client = client()?;

    if remote {
        let detail = client.user_detail().await?;
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    match client.session().current_user()? {
        Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
        None => println!("Not logged in"),
    }
    Ok(())
}

fn read_password() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(CliError::InvalidInput(
            "password required (--password, SALESO_PASSWORD or stdin)".to_string(),
        ));
    }
    Ok(password)
}
