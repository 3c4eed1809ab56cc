//! Dashboard theme preference.

use saleso_core::ThemeMode;

use super::{CliError, client};

/// Print the stored theme.
#[allow(clippy::print_stdout)]
pub fn get() -> Result<(), CliError> {
    println!("{}", client()?.session().theme_mode()?);
    Ok(())
}

/// Store a theme.
#[allow(clippy::print_stdout)]
pub fn set(mode: &str) -> Result<(), CliError> {
    let mode: ThemeMode = mode
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("unknown theme '{mode}' (light, dark)")))?;
    client()?.session().set_theme_mode(mode)?;
    println!("Theme set to {mode}");
    Ok(())
}

/// Switch between light and dark.
#[allow(clippy::print_stdout)]
pub fn toggle() -> Result<(), CliError> {
    let client = client()?;
    let mode = client.session().theme_mode()?.toggled();
    client.session().set_theme_mode(mode)?;
    println!("Theme set to {mode}");
    Ok(())
}
