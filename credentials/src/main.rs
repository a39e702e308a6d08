//! `tealeaf` CLI: generate and check credential hashes, and seed or reset
//! admin and customer logins in the configured credential store.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tealeaf_credentials::accounts::{Accounts, JsonCredentialStore, Realm};
use tealeaf_credentials::config::{load_config, Config};
use tealeaf_credentials::crypto::passwords::{hash_password_async, verify_password_async};
use tealeaf_credentials::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "tealeaf", version, about = "Storefront credential hashing utilities")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(long, global = true, env = "TEALEAF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RealmArg {
    Admin,
    Customer,
}

impl From<RealmArg> for Realm {
    fn from(value: RealmArg) -> Self {
        match value {
            RealmArg::Admin => Realm::Admin,
            RealmArg::Customer => Realm::Customer,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored value for a plaintext credential.
    HashPassword { plaintext: String },
    /// Check a plaintext credential against a stored value.
    VerifyPassword { plaintext: String, stored: String },
    /// Create or reset an account's credential.
    SetPassword {
        #[arg(long, value_enum, default_value = "customer")]
        realm: RealmArg,
        account: String,
        plaintext: String,
    },
    /// Check a login attempt against the store.
    Login {
        #[arg(long, value_enum, default_value = "customer")]
        realm: RealmArg,
        account: String,
        plaintext: String,
    },
    /// Delete an account's credential.
    RemoveAccount {
        #[arg(long, value_enum, default_value = "customer")]
        realm: RealmArg,
        account: String,
    },
}

fn verdict(matched: bool) -> &'static str {
    if matched {
        "match"
    } else {
        "no-match"
    }
}

async fn run(command: Command, config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let accounts = Accounts::new(JsonCredentialStore::new(&config.store_path));
    let store_path = accounts.store().path().display().to_string();

    match command {
        Command::HashPassword { plaintext } => {
            let stored = hash_password_async(plaintext).await.context("hashing failed")?;
            writeln!(out, "{stored}")?;
        }
        Command::VerifyPassword { plaintext, stored } => {
            writeln!(out, "{}", verdict(verify_password_async(plaintext, stored).await))?;
        }
        Command::SetPassword {
            realm,
            account,
            plaintext,
        } => {
            let realm = Realm::from(realm);
            accounts
                .set_password(realm, &account, &plaintext)
                .await
                .with_context(|| {
                    format!("setting {realm} credential for {account:?} in {store_path} failed")
                })?;
            writeln!(out, "updated")?;
        }
        Command::Login {
            realm,
            account,
            plaintext,
        } => {
            let matched = accounts
                .authenticate(realm.into(), &account, &plaintext)
                .await
                .with_context(|| format!("login check against {store_path} failed"))?;
            writeln!(out, "{}", verdict(matched))?;
        }
        Command::RemoveAccount { realm, account } => {
            let removed = accounts
                .remove(realm.into(), &account)
                .await
                .with_context(|| format!("removing {account:?} from {store_path} failed"))?;
            writeln!(out, "{}", if removed { "removed" } else { "not-found" })?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    init_tracing(&config.log_filter)?;

    run(cli.command, &config, &mut std::io::stdout().lock()).await
}
