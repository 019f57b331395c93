//! Subcommand handlers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use kanau::processor::Processor;
use p2pay_core::dashboard::{AccountSnapshot, Dashboard};
use p2pay_core::events::{FlowEvent, FlowEventReceiver, flow_event_channel};
use p2pay_core::flow::{ScanPayFlow, ScanPayStage, SendFlow, SendStage};
use p2pay_core::framework::BackendProcessor;
use p2pay_core::session::{Session, establish_session};
use p2pay_sdk::client::BackendClient;
use p2pay_sdk::objects::{QuoteRequest, UserId};
use p2pay_sdk::wallet::derive_wallet;

use crate::config::LoadedConfig;
use crate::scanner::StdinScanner;

pub struct Context {
    config: LoadedConfig,
    backend: BackendProcessor,
}

impl Context {
    pub fn new(config: LoadedConfig) -> anyhow::Result<Self> {
        let client = BackendClient::with_options(config.backend_url.clone(), config.client)
            .context("failed to build the backend HTTP client")?;
        Ok(Self {
            config,
            backend: BackendProcessor::new(client),
        })
    }

    fn uid(&self) -> anyhow::Result<UserId> {
        self.config
            .uid
            .clone()
            .context("no user id configured; pass --uid, set P2PAY_UID or add [account] uid")
    }

    async fn session(&self) -> anyhow::Result<Session> {
        let session = establish_session(&self.backend, self.uid()?).await?;
        if let Some(notice) = session.notice() {
            eprintln!("{notice}");
        }
        Ok(session)
    }
}

pub fn derive(ctx: &Context, identifier: Option<String>, show_private_key: bool) -> anyhow::Result<()> {
    let identifier = match identifier {
        Some(identifier) => identifier,
        None => ctx.uid()?.to_string(),
    };
    let wallet = derive_wallet(&identifier).context("no wallet can be derived from an empty identifier")?;
    println!("{}", wallet.address());
    if show_private_key {
        println!("{}", wallet.private_key_hex());
    }
    Ok(())
}

pub async fn login(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session().await?;
    println!("uid:     {}", session.uid());
    println!("wallet:  {}", session.wallet_address());
    println!("mode:    {:?}", session.mode());
    if let Some(balance) = session.initial_balance() {
        println!("balance: {balance}");
    }
    Ok(())
}

pub async fn dashboard(ctx: &Context) -> anyhow::Result<()> {
    let dashboard = Dashboard::new(ctx.backend.clone(), ctx.session().await?);
    dashboard.refresh().await;
    print_snapshot(&dashboard.snapshot());
    Ok(())
}

pub async fn quote(ctx: &Context, amount_inr: String) -> anyhow::Result<()> {
    let response = ctx
        .backend
        .process(QuoteRequest {
            amount_inr: amount_inr.clone(),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!(
        "₹{amount_inr} = {} USDC (1 USDC = ₹{})",
        response.amount_usdc, response.rate
    );
    Ok(())
}

pub async fn send(ctx: &Context, to: String, amount: String, yes: bool) -> anyhow::Result<()> {
    let (events_tx, events_rx) = flow_event_channel();
    let mut flow = SendFlow::new(ctx.backend.clone(), ctx.uid()?, events_tx);
    flow.set_recipient(to)?;
    flow.set_amount(amount)?;

    if !yes && !confirm(&format!("Send {} USDC to {}?", flow.amount(), flow.recipient()))? {
        flow.close();
        println!("Cancelled.");
        return Ok(());
    }

    match flow.submit().await? {
        SendStage::Success => {
            if let Some(summary) = flow.summary() {
                println!("{summary}");
            }
            flow.dismiss()?;
            refresh_on_request(ctx, events_rx).await
        }
        _ => bail!(flow.error().unwrap_or("Transaction Failed").to_owned()),
    }
}

pub async fn pay(
    ctx: &Context,
    upi: Option<String>,
    scan: bool,
    amount_inr: String,
    yes: bool,
) -> anyhow::Result<()> {
    let (events_tx, events_rx) = flow_event_channel();
    let mut flow = ScanPayFlow::new(
        ctx.backend.clone(),
        Arc::new(ctx.backend.clone()),
        Arc::new(StdinScanner),
        ctx.uid()?,
        ctx.config.flow,
        events_tx,
    );

    if let Some(upi) = upi {
        flow.set_merchant(upi)?;
    }
    if scan {
        flow.start_scan()?;
        eprintln!("Waiting for QR text on stdin...");
        flow.next_scan_event().await?;
        if flow.merchant().trim().is_empty() {
            bail!("no payee was scanned");
        }
        eprintln!("Scanned {}", flow.merchant());
    }
    flow.set_amount_inr(amount_inr)?;
    flow.continue_to_review().await?;

    println!(
        "Pay ₹{} to {}: {} USDC (1 USDC = ₹{})",
        flow.amount_inr(),
        flow.merchant(),
        flow.amount_usdc(),
        flow.rate()
    );
    if !yes && !confirm("Confirm payment?")? {
        flow.close();
        println!("Cancelled.");
        return Ok(());
    }

    loop {
        match flow.pay().await? {
            ScanPayStage::Success => break,
            _ => {
                let message = flow.error().unwrap_or("Transaction Failed").to_owned();
                eprintln!("Payment failed: {message}");
                if yes || !confirm("Retry?")? {
                    bail!(message);
                }
                flow.retry()?;
            }
        }
    }

    if let Some(summary) = flow.summary() {
        println!("{summary}");
    }
    if let Some(remaining) = flow.remaining_balance_display() {
        println!("Remaining balance: {remaining}");
    }
    flow.dismiss()?;
    refresh_on_request(ctx, events_rx).await
}

/// Show fresh account data if a finished flow asked for it.
async fn refresh_on_request(ctx: &Context, mut events: FlowEventReceiver) -> anyhow::Result<()> {
    while let Ok(FlowEvent::DataRefreshRequested { source }) = events.try_recv() {
        tracing::debug!(%source, "Refreshing account data");
        let dashboard = Dashboard::new(ctx.backend.clone(), ctx.session().await?);
        dashboard.refresh().await;
        print_snapshot(&dashboard.snapshot());
    }
    Ok(())
}

fn print_snapshot(snapshot: &AccountSnapshot) {
    println!("Wallet:  {}", snapshot.address);
    println!("Balance: {} {}", snapshot.balance_display(), snapshot.symbol);
    if snapshot.history.is_empty() {
        println!("No transactions yet.");
        return;
    }
    println!("Recent activity:");
    for entry in &snapshot.history {
        println!(
            "  {:<12} {:<8} {:>14}  {}  {}",
            entry.date, entry.kind, entry.amount, entry.to, entry.status
        );
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
