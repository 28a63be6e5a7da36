#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use jmspam_core::{Secret, SecretQuery};
use jmspam_sign::{RequestBuilder, RequestDescriptor};

#[derive(Parser)]
#[command(
    name = "jpam",
    version,
    about = "Fetch account secrets from a JumpServer PAM API."
)]
struct Cli {
    /// API endpoint, e.g. https://jumpserver.example.com
    #[arg(long, env = "JMS_URL")]
    url: String,

    /// Access key id.
    #[arg(long, env = "JMS_KEY_ID")]
    key_id: String,

    /// Access key secret.
    #[arg(long, env = "JMS_KEY_SECRET", hide_env_values = true)]
    key_secret: String,

    /// Organization id.
    #[arg(
        long,
        env = "JMS_ORG_ID",
        default_value = "00000000-0000-0000-0000-000000000002"
    )]
    org_id: String,

    /// Asset name.
    #[arg(long)]
    asset: Option<String>,

    /// Asset id (UUID).
    #[arg(long)]
    asset_id: Option<String>,

    /// Account username on the asset.
    #[arg(long)]
    account: Option<String>,

    /// Account id (UUID); excludes the other selectors.
    #[arg(long)]
    account_id: Option<String>,

    /// Print the full result envelope as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let query = SecretQuery {
        asset: cli.asset,
        asset_id: cli.asset_id,
        account: cli.account,
        account_id: cli.account_id,
    };
    let op = query.to_operation()?;

    let builder = RequestBuilder::new(
        cli.url,
        cli.key_id,
        cli.key_secret.into_bytes(),
        cli.org_id,
    );
    let request = builder.build(&op, chrono::Utc::now())?;
    let secret = fetch(&request)?;

    if cli.json {
        println!("{}", serde_json::to_string(&secret)?);
        if !secret.is_valid() {
            std::process::exit(1);
        }
        return Ok(());
    }

    if secret.is_valid() {
        println!("{}", secret.secret.unwrap_or_default());
        Ok(())
    } else {
        bail!("{}", secret.desc);
    }
}

fn fetch(request: &RequestDescriptor) -> Result<Secret> {
    let method = reqwest::Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
        .context("invalid request method")?;

    let client = reqwest::blocking::Client::new();
    let mut req = client.request(method, &request.url);
    for (name, value) in &request.headers {
        req = req.header(name.as_str(), value.as_str());
    }

    let secret = match req.send() {
        Ok(response) => {
            let status = response.status().as_u16();
            match response.json::<serde_json::Value>() {
                Ok(body) => Secret::from_response(status, &body),
                Err(err) => Secret::from_error(err),
            }
        }
        Err(err) => Secret::from_error(err),
    };
    Ok(secret)
}
