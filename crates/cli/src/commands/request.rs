//! Raw authenticated requests.
//!
//! # Usage
//!
//! ```bash
//! saleso request GET /discount
//! saleso request PUT /user/update --body '{"phone":"+34600000000"}'
//! ```

use reqwest::Method;
use serde_json::Value;

use super::{CliError, client};

/// Send `method path` through the gateway and print the response.
#[allow(clippy::print_stdout)]
pub async fn send(method: &str, path: &str, body: Option<&str>) -> Result<(), CliError> {
    let method = parse_method(method)?;
    let body: Option<Value> = body.map(serde_json::from_str).transpose()?;

    let response: Value = client()?
        .gateway()
        .send(method, path, body.as_ref())
        .await?;

    if !response.is_null() {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

fn parse_method(method: &str) -> Result<Method, CliError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(CliError::InvalidInput(format!("unsupported method '{other}'"))),
    }
}
