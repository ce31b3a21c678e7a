//! CLI entry point for mailflow.
//!
//! stdout は JSON のみ、ログは stderr に出します。
//! 業務エラー（NOT_FOUND など）は JSON で出力して終了コード 2、
//! インフラ障害は終了コード 1。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use mailflow_core::impls::{JsonFileEmailStore, LoggingMailer};
use mailflow_core::{
    AppBuilder, Config, Email, EmailDraft, EmailError, EmailId, EmailService, Priority,
    SendOutcome, ServiceError,
};

const EXIT_OK: u8 = 0;
const EXIT_REJECTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "mailflow")]
#[command(about = "Create, edit and send emails through a validated lifecycle")]
struct Cli {
    /// JSON file holding the emails (overrides MAILFLOW_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every stored email
    List,
    /// Show one email
    Get { id: EmailId },
    /// Store a new PENDING email
    Create(DraftArgs),
    /// Replace the fields of a PENDING email
    Update {
        id: EmailId,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Deliver one email and mark it SENT
    Send { id: EmailId },
    /// Deliver every PENDING email
    SendPending,
    /// Show the status of one email
    Status { id: EmailId },
    /// Count emails per status
    Counts,
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(short, long, default_value = "")]
    subject: String,

    #[arg(short, long, default_value = "")]
    body: String,

    /// Recipient address (repeatable)
    #[arg(long = "to")]
    recipients: Vec<String>,

    /// Attachment reference (repeatable)
    #[arg(long = "attach")]
    attachments: Vec<String>,

    /// low, normal or high
    #[arg(short, long, default_value = "normal")]
    priority: Priority,
}

impl From<DraftArgs> for EmailDraft {
    fn from(args: DraftArgs) -> Self {
        EmailDraft {
            subject: args.subject,
            body: args.body,
            recipients: args.recipients.into_iter().collect(),
            attachments: args.attachments.into_iter().collect(),
            priority: args.priority,
        }
    }
}

/// One line of `send-pending` output.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum BatchItem<'a> {
    Sent { email: &'a Email },
    Rejected { error: &'a EmailError },
    Failed { error: String },
}

impl<'a> From<&'a SendOutcome> for BatchItem<'a> {
    fn from(outcome: &'a SendOutcome) -> Self {
        match outcome {
            Ok(email) => BatchItem::Sent { email },
            Err(ServiceError::Rejected(error)) => BatchItem::Rejected { error },
            Err(other) => BatchItem::Failed {
                error: other.to_string(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = Config::from_env().context("reading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.store.unwrap_or_else(|| config.store_path.clone());
    tracing::debug!(
        store = %path.display(),
        batch_concurrency = config.batch_concurrency,
        rejected_domains = config.rejected_domains.len(),
        "configuration loaded"
    );
    let store = JsonFileEmailStore::open(&path)
        .await
        .with_context(|| format!("opening store {}", path.display()))?;
    let mailer = LoggingMailer::new().with_rejected_domains(&config.rejected_domains);

    let service = AppBuilder::new()
        .store(Arc::new(store))
        .mailer(Arc::new(mailer))
        .config(&config)
        .build()?;

    execute(&service, cli.command).await
}

async fn execute(service: &EmailService, command: Command) -> anyhow::Result<u8> {
    match command {
        Command::List => render(service.find_all().await),
        Command::Get { id } => render(service.find_by_id(id).await),
        Command::Create(draft) => render(service.create(draft.into()).await),
        Command::Update { id, draft } => render(service.update(id, draft.into()).await),
        Command::Send { id } => render(service.send(id).await),
        Command::Status { id } => render(service.find_status(id).await),
        Command::Counts => render(service.counts().await),
        Command::SendPending => {
            let outcomes = service.send_all_pending().await?;
            let items: Vec<BatchItem<'_>> = outcomes.iter().map(BatchItem::from).collect();
            print_json(&items)?;
            Ok(EXIT_OK)
        }
    }
}

fn render<T: Serialize>(result: Result<T, ServiceError>) -> anyhow::Result<u8> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(EXIT_OK)
        }
        Err(ServiceError::Rejected(error)) => {
            print_json(&error)?;
            Ok(EXIT_REJECTED)
        }
        Err(other) => Err(other.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailflow_core::impls::InMemoryEmailStore;
    use mailflow_core::ErrorKind;

    fn service() -> EmailService {
        AppBuilder::new()
            .store(Arc::new(InMemoryEmailStore::new()))
            .mailer(Arc::new(LoggingMailer::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn parses_create_flags() {
        let cli = Cli::try_parse_from([
            "mailflow", "--store", "x.json", "create", "--subject", "hi", "--to", "a@x.com",
            "--to", "b@x.com", "--to", "a@x.com", "--priority", "high",
        ])
        .unwrap();

        assert_eq!(cli.store, Some(PathBuf::from("x.json")));
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let draft = EmailDraft::from(args);
        assert_eq!(draft.subject, "hi");
        assert_eq!(draft.recipients.len(), 2);
        assert_eq!(draft.priority, Priority::High);
    }

    #[test]
    fn rejects_malformed_id() {
        assert!(Cli::try_parse_from(["mailflow", "send", "nope"]).is_err());
    }

    #[tokio::test]
    async fn business_errors_exit_with_two() {
        let service = service();
        let id: EmailId = "01ARZ3NDEKTSV4RRFFQ69G5FAV".parse().unwrap();

        let code = execute(&service, Command::Send { id }).await.unwrap();

        assert_eq!(code, EXIT_REJECTED);
    }

    #[tokio::test]
    async fn batch_items_are_tagged() {
        let service = service();
        service
            .create(EmailDraft::new("ok", "").with_recipient("a@x.com"))
            .await
            .unwrap();
        service.create(EmailDraft::new("empty", "")).await.unwrap();

        let outcomes = service.send_all_pending().await.unwrap();
        let items: Vec<BatchItem<'_>> = outcomes.iter().map(BatchItem::from).collect();
        let v = serde_json::to_value(&items).unwrap();

        assert_eq!(v[0]["outcome"], "sent");
        assert_eq!(v[0]["email"]["status"], "SENT");
        assert_eq!(v[1]["outcome"], "rejected");
        assert_eq!(v[1]["error"]["kind"], ErrorKind::NoRecipients.as_str());
    }
}
