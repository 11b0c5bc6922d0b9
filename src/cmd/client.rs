use serde_json::{Value, json};

use crate::{
    conf::Settings,
    pkg::client::{
        Outcome, backend_from,
        forms::{FormSession, Tab},
        wallet::{Reaction, RpcWallet, WalletConnector},
    },
    prelude::Result,
};

/// `key=value` pairs for `--field`.
pub fn parse_field(raw: &str) -> core::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got {:?}", raw)),
    }
}

pub async fn connect(settings: &Settings, watch: bool) -> Result<()> {
    let mut wallet = WalletConnector::new(RpcWallet::detect(settings).await?);
    let address = wallet.connect().await?;
    println!("Wallet connected successfully! {}", address);
    if !watch {
        return Ok(());
    }

    let watcher = wallet.provider().watch();
    loop {
        tokio::select! {
            reaction = wallet.next_reaction() => match reaction {
                Some(Reaction::AccountSwitched(address)) => println!("Connected: {}", address),
                Some(Reaction::Reload(chain_id)) => {
                    println!("network changed to {}, reconnecting", chain_id);
                    wallet.disconnect();
                    let address = wallet.connect().await?;
                    println!("Wallet connected successfully! {}", address);
                }
                Some(Reaction::Ignored) => {}
                Some(Reaction::Disconnected) | None => {
                    println!("Wallet disconnected");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                wallet.disconnect();
                break;
            }
        }
    }
    watcher.abort();
    Ok(())
}

pub fn render(outcome: &Outcome) -> Result<Value> {
    Ok(match outcome {
        Outcome::Receipt(receipt) => serde_json::to_value(receipt)?,
        Outcome::Applications(applications) => {
            let rows: Vec<Value> = applications
                .iter()
                .map(|app| {
                    json!({
                        "jobSeeker": app.job_seeker,
                        "status": app.status,
                        "applied": app.applied_at().map(|t| t.to_rfc3339()),
                    })
                })
                .collect();
            json!({ "applications": rows })
        }
        Outcome::JobIds(ids) => json!({ "jobIds": ids }),
    })
}

pub async fn submit(settings: &Settings, tab: Tab, fields: Vec<(String, String)>) -> Result<()> {
    let backend = backend_from(settings)?;
    let mut session = FormSession::new();
    session.select(tab);
    for (field, value) in fields {
        session.set(&field, value)?;
    }

    match session.submit(&*backend).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&render(&outcome)?)?);
            if let Some(message) = session.message() {
                println!("{}", message);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(error) = session.error() {
                eprintln!("{}", error);
            }
            Err(e)
        }
    }
}
