use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use paydesk_bus::Topic;
use paydesk_core::*;
use paydesk_ledger::{
    current_method_description, max_payment, reschedule_options, roll_in_ceiling, PaymentMethod,
    PaymentTarget, ProfileUpdate,
};
use paydesk_playback::format_duration;
use paydesk_schema::{BusMessage, Customer, Money, Speaker, TranscriptMessage};

#[derive(Parser)]
#[command(name = "paydesk", version, about = "Payment-plan agent console")]
struct Cli {
    #[arg(long, default_value = ".", help = "Config root directory (contains config/)")]
    config_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Replay the scripted support call")]
    Demo {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..), help = "Play the call this many times faster")]
        speed: u64,
        #[arg(long, help = "Stop at the reschedule action instead of applying it")]
        no_apply: bool,
    },
    #[command(about = "Show the account card and manage-plan menu")]
    Account {
        #[arg(long, value_name = "ID", help = "Switch to a linked account first")]
        select: Option<String>,
    },
    #[command(about = "Apply a payment")]
    Pay {
        #[arg(help = "Amount, e.g. 120.69 or $1,200.00")]
        amount: Money,
        #[arg(long, value_enum, default_value_t = TargetArg::Plan)]
        target: TargetArg,
        #[command(flatten)]
        method: MethodArgs,
    },
    #[command(about = "Move utility balance into the payment plan")]
    RollIn {
        #[arg(help = "Amount to roll in")]
        amount: Money,
    },
    #[command(about = "Move the next payment date")]
    Reschedule {
        #[arg(help = "New date, YYYY-MM-DD")]
        date: NaiveDate,
    },
    #[command(about = "Change the method on the most recent receipt")]
    UpdateMethod {
        #[command(flatten)]
        method: MethodArgs,
        #[arg(long, help = "Billing address for the new method")]
        billing_address: Option<String>,
    },
    #[command(about = "Edit the customer's contact details")]
    UpdateProfile {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    #[command(about = "Validate config files")]
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Plan,
    Utility,
    Both,
}

impl From<TargetArg> for PaymentTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Plan => PaymentTarget::Plan,
            TargetArg::Utility => PaymentTarget::Utility,
            TargetArg::Both => PaymentTarget::Both,
        }
    }
}

#[derive(Args, Default)]
struct MethodArgs {
    #[arg(long, help = "Bank name")]
    bank: Option<String>,
    #[arg(long, requires = "bank", help = "Last 4 digits of the bank account")]
    account_last4: Option<String>,
    #[arg(long, help = "Card number or its last 4 digits")]
    card: Option<String>,
    #[arg(long, help = "Venmo handle")]
    venmo: Option<String>,
    #[arg(long, help = "PayPal email")]
    paypal: Option<String>,
    #[arg(long, help = "Zelle email or phone")]
    zelle: Option<String>,
}

impl MethodArgs {
    /// No method flag means the account's default method.
    fn into_method(self) -> Result<PaymentMethod> {
        let mut chosen = Vec::new();
        if let Some(bank_name) = self.bank {
            chosen.push(PaymentMethod::Bank {
                bank_name,
                last4: self.account_last4.unwrap_or_default(),
            });
        }
        if let Some(number) = self.card {
            chosen.push(PaymentMethod::Card { number });
        }
        if let Some(handle) = self.venmo {
            chosen.push(PaymentMethod::Venmo { handle });
        }
        if let Some(email) = self.paypal {
            chosen.push(PaymentMethod::Paypal { email });
        }
        if let Some(contact) = self.zelle {
            chosen.push(PaymentMethod::Zelle { contact });
        }

        if chosen.len() > 1 {
            bail!("choose a single payment method");
        }
        Ok(chosen.pop().unwrap_or(PaymentMethod::Default))
    }
}

#[derive(Args, Default)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        ProfileUpdate {
            name: args.name,
            email: args.email,
            phone: args.phone,
            address: args.address,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_root.join("config");

    match cli.command {
        Commands::Validate => {
            let config = load_config(&config_dir)?;
            println!(
                "Config valid. Account {}, {} transcript messages.",
                config.customer.id,
                config.script.messages.len()
            );
        }
        Commands::Demo { speed, no_apply } => {
            let mut config = load_or_builtin(&config_dir)?;
            config.main.playback = config.main.playback.accelerated(speed);
            run_demo(config, !no_apply).await?;
        }
        Commands::Account { select } => {
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            if let Some(id) = select {
                if console.select_customer(&id).await.is_none() {
                    bail!("no linked account with id {id}");
                }
            }
            print_account_card(&console.account(), &console.manage_plan_actions());
            print_switcher(&console).await;
        }
        Commands::Pay {
            amount,
            target,
            method,
        } => {
            let target = PaymentTarget::from(target);
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            let amount = clamp_amount(amount, max_payment(&console.account(), target))?;
            let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;
            let account = console
                .make_payment(amount, target, &method.into_method()?)
                .await?;
            print_outcome(&account, &mut notes).await?;
        }
        Commands::RollIn { amount } => {
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            let amount = clamp_amount(amount, roll_in_ceiling(&console.account()))?;
            let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;
            let account = console.roll_in(amount).await;
            print_outcome(&account, &mut notes).await?;
        }
        Commands::Reschedule { date } => {
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;
            let account = console.reschedule(date).await;
            print_outcome(&account, &mut notes).await?;
        }
        Commands::UpdateProfile { profile } => {
            let update = ProfileUpdate::from(profile);
            if update.is_empty() {
                bail!("nothing to update: pass --name, --email, --phone or --address");
            }
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;
            let account = console.update_customer(update).await;
            print_outcome(&account, &mut notes).await?;
        }
        Commands::UpdateMethod {
            method,
            billing_address,
        } => {
            let console = Console::start(load_or_builtin(&config_dir)?).await?;
            let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;
            let account = console
                .update_payment_method(method.into_method()?, billing_address)
                .await?;
            print_outcome(&account, &mut notes).await?;
        }
    }

    Ok(())
}

/// Ledger operations expect `0 < amount <= ceiling`; larger amounts are
/// lowered to the ceiling the way the payment form caps its input.
fn clamp_amount(amount: Money, ceiling: Money) -> Result<Money> {
    if !amount.is_positive() {
        bail!("amount must be greater than $0.00, got {amount}");
    }
    if !ceiling.is_positive() {
        bail!("nothing to apply: the balance is {ceiling}");
    }
    if amount > ceiling {
        tracing::warn!(%amount, %ceiling, "amount lowered to the available balance");
        return Ok(ceiling);
    }
    Ok(amount)
}

fn load_or_builtin(config_dir: &Path) -> Result<PaydeskConfig> {
    if config_dir.join("main.yaml").exists() {
        return load_config(config_dir);
    }
    tracing::warn!(
        dir = %config_dir.display(),
        "no main.yaml found, using built-in account and call script"
    );
    Ok(PaydeskConfig::builtin())
}

async fn run_demo(config: PaydeskConfig, apply: bool) -> Result<()> {
    let idle = Duration::from_millis(config.main.playback.reveal_step_ms * 2);
    let console = Console::start(config).await?;
    let mut reveals = console.bus().subscribe(Topic::TranscriptRevealed).await;
    let mut notes = console.bus().subscribe(Topic::NotificationPublished).await;

    console.open_call_panel().await;
    console
        .answer_call()
        .await
        .ok_or_else(|| anyhow!("call panel was not waiting for an answer"))?;

    let mut printed = 0;
    while let Ok(Some(msg)) = timeout(idle, reveals.recv()).await {
        if matches!(msg, BusMessage::TranscriptRevealed { .. }) {
            printed = print_transcript_from(&console, printed).await;
        }
    }

    if apply {
        if let Some(preview) = console.impact_preview() {
            console.view_impact().await;
            println!("\n{preview}\n");
            console.dismiss_impact().await;
        }
        if console.apply_reschedule().await {
            print_transcript_from(&console, printed).await;
            print_notification(&mut notes).await;
            println!(
                "Next payment: {} due {}",
                console.account().next_payment,
                console.account().next_payment_date
            );
        } else {
            println!("No reschedule action in this call.");
        }
    }

    let snapshot = console.call_snapshot().await;
    println!("Call duration {}", format_duration(snapshot.duration_seconds));
    console.close_call_panel().await;
    Ok(())
}

async fn print_transcript_from(console: &Console, printed: usize) -> usize {
    let shown = console.transcript().await;
    for message in shown.get(printed..).unwrap_or_default() {
        print_message(message);
    }
    shown.len().max(printed)
}

fn print_message(message: &TranscriptMessage) {
    let speaker = match message.speaker {
        Speaker::Customer => "Customer",
        Speaker::System => "System",
        Speaker::Agent => "Agent",
    };
    match &message.metadata {
        Some(tag) => println!("[{}] {speaker} ({tag}): {}", message.timestamp, message.text),
        None => println!("[{}] {speaker}: {}", message.timestamp, message.text),
    }
    for action in &message.actions {
        println!("    [{}]", action.label);
    }
}

fn print_account_card(account: &Customer, actions: &[ManagePlanAction]) {
    println!("{} ({})", account.name, account.account_number);
    println!("Utility balance:      {}", account.utility_total_balance);
    println!("Payment plan balance: {}", account.payment_plan_balance);
    println!(
        "Next payment:         {} due {}",
        account.next_payment, account.next_payment_date
    );
    println!(
        "Plan:                 {} of {} months remaining",
        account.months_remaining, account.plan_length
    );
    println!("Payment method:       {}", current_method_description(account));
    println!(
        "Max payment:          {}",
        max_payment(account, PaymentTarget::Both)
    );

    println!("\nManage plan:");
    for action in actions {
        let suffix = if action.is_enabled() { "" } else { " (unavailable)" };
        println!("  - {}{suffix}", action.label());
    }

    println!("\nReschedule options:");
    for option in reschedule_options(Local::now().date_naive()) {
        println!("  {:<18} {}", option.label, option.value());
    }
}

async fn print_switcher(console: &Console) {
    let current = console.account();
    println!("\nLinked accounts:");
    for linked in console.linked_accounts() {
        let marker = if linked.id == current.id { "*" } else { " " };
        let address = linked.address.as_deref().unwrap_or("no address on file");
        println!("{marker} {:<16} {:<18} {address}", linked.account_number, linked.name);
    }

    println!("\nRecently viewed:");
    for viewed in console.recently_viewed().await {
        println!("  {:<16} {}", viewed.id, viewed.name);
    }
}

async fn print_outcome(
    account: &Arc<Customer>,
    notes: &mut mpsc::Receiver<BusMessage>,
) -> Result<()> {
    print_notification(notes).await;
    println!("{}", serde_json::to_string_pretty(account.as_ref())?);
    Ok(())
}

async fn print_notification(notes: &mut mpsc::Receiver<BusMessage>) {
    if let Ok(Some(BusMessage::NotificationPublished { notification, .. })) =
        timeout(Duration::from_secs(1), notes.recv()).await
    {
        println!("{:?}: {}", notification.kind, notification.message);
    }
}
