use std::fs;
use std::io::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use custody_registry::{RegistryGateway, RpcTransport};
use custody_storage::{FetchedEvidence, ProgressObserver, StorageClient};
use custody_submit::{SubmissionDraft, SubmissionOrchestrator, UploadMode};
use custody_types::{Address, CaseId, Cid, SubmitterType};
use custody_wallet::{FileMarker, LocalKeyProvider, Session, WalletSession};

use crate::cli::{
    AccountArgs, ApproveArgs, Cli, Command, CreateCaseArgs, FetchArgs, GetCaseArgs,
    IsPoliceArgs, LinkTipArgs, SubmitArgs,
};
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Submit(args) => cmd_submit(&config, args).await,
        Command::CreateCase(args) => cmd_create_case(&config, args).await,
        Command::Approve(args) => cmd_approve(&config, args).await,
        Command::LinkTip(args) => cmd_link_tip(&config, args).await,
        Command::GetCase(args) => cmd_get_case(&config, args).await,
        Command::IsPolice(args) => cmd_is_police(&config, args).await,
        Command::Fetch(args) => cmd_fetch(&config, args).await,
        Command::Account(args) => cmd_account(&config, args).await,
    }
}

fn gateway(config: &CliConfig) -> anyhow::Result<RegistryGateway<RpcTransport>> {
    let transport = Arc::new(RpcTransport::new(config.rpc_url.clone()));
    Ok(RegistryGateway::new(transport, config.contract_address()?))
}

fn build_session(config: &CliConfig) -> anyhow::Result<Arc<WalletSession>> {
    let marker = Box::new(FileMarker::new(&config.marker_path));
    let session = match &config.key_file {
        Some(path) => {
            let secret = fs::read_to_string(path)
                .with_context(|| format!("reading key file {}", path.display()))?;
            let provider = LocalKeyProvider::from_hex(secret.trim(), config.chain_id)?;
            WalletSession::with_provider(Arc::new(provider), marker)
        }
        None => WalletSession::without_provider(marker),
    };
    Ok(Arc::new(session))
}

/// Resume silently when the marker allows it; otherwise connect.
async fn connected_session(
    config: &CliConfig,
) -> anyhow::Result<(Arc<WalletSession>, Session)> {
    let session = build_session(config)?;
    let current = match session.try_resume().await? {
        Some(current) => current,
        None => session.connect().await?,
    };
    Ok((session, current))
}

async fn cmd_submit(config: &CliConfig, args: SubmitArgs) -> anyhow::Result<()> {
    let (session, current) = connected_session(config).await?;
    let uploader = Arc::new(StorageClient::new(config.storage.clone())?);
    let mode = if args.plain { UploadMode::Plain } else { UploadMode::Encrypted };
    let observer: Arc<dyn ProgressObserver> = Arc::new(|percent: f32| {
        print!("\r  uploading {percent:>5.1}%");
        let _ = std::io::stdout().flush();
    });
    let mut orchestrator = SubmissionOrchestrator::new(session, uploader, gateway(config)?)
        .with_mode(mode)
        .with_observer(observer);

    let mut draft = SubmissionDraft::new();
    draft.set_case_id(&args.case);
    if let Some(path) = &args.file {
        draft.set_file(path);
    }
    if let Some(text) = &args.text {
        draft.set_text(text);
    }
    draft.set_submitter(if args.anonymous {
        SubmitterType::Anonymous
    } else {
        SubmitterType::Authenticated
    });
    if let Some(key_ref) = &args.key_ref {
        draft.set_key_ref(key_ref);
    }

    let outcome = orchestrator.submit(&draft).await?;
    println!();
    println!(
        "{} Evidence recorded on case {}",
        "✓".green().bold(),
        args.case.yellow()
    );
    println!("  Submitter: {}", current.account);
    println!("  Digest:    {}", outcome.digest);
    println!("  CID:       {}", outcome.cid.to_string().cyan());
    println!("  Tx:        {}", outcome.tx_hash);
    println!("  Block:     {}", outcome.block_number);
    Ok(())
}

async fn cmd_create_case(config: &CliConfig, args: CreateCaseArgs) -> anyhow::Result<()> {
    let (_session, current) = connected_session(config).await?;
    let case_id = CaseId::parse(&args.case)?;
    let inclusion = gateway(config)?
        .create_case(current.account, case_id, &args.metadata_hash, &args.public_key)
        .await?
        .confirmed()
        .await?;
    println!(
        "{} Case {} created (tx {}, block {})",
        "✓".green().bold(),
        case_id.to_string().yellow(),
        inclusion.tx_hash,
        inclusion.block_number
    );
    Ok(())
}

async fn cmd_approve(config: &CliConfig, args: ApproveArgs) -> anyhow::Result<()> {
    let (_session, current) = connected_session(config).await?;
    let case_id = CaseId::parse(&args.case)?;
    let inclusion = gateway(config)?
        .approve_evidence(current.account, case_id, args.index)
        .await?
        .confirmed()
        .await?;
    println!(
        "{} Evidence {} on case {} approved (tx {})",
        "✓".green().bold(),
        args.index,
        case_id.to_string().yellow(),
        inclusion.tx_hash
    );
    Ok(())
}

async fn cmd_link_tip(config: &CliConfig, args: LinkTipArgs) -> anyhow::Result<()> {
    let (_session, current) = connected_session(config).await?;
    let case_id = CaseId::parse(&args.case)?;
    let inclusion = gateway(config)?
        .link_tip(current.account, args.tip, case_id)
        .await?
        .confirmed()
        .await?;
    println!(
        "{} Tip {} linked to case {} (tx {})",
        "✓".green().bold(),
        args.tip,
        case_id.to_string().yellow(),
        inclusion.tx_hash
    );
    Ok(())
}

async fn cmd_get_case(config: &CliConfig, args: GetCaseArgs) -> anyhow::Result<()> {
    let case_id = CaseId::parse(&args.case)?;
    match gateway(config)?.get_case(case_id).await? {
        Some(record) => {
            println!("Case {}", record.id.to_string().yellow().bold());
            println!("  Creator:  {}", record.creator);
            println!("  Metadata: {}", record.metadata_hash);
            println!("  Created:  {}", record.created_at);
            println!(
                "  Status:   {}",
                if record.is_open { "open".green() } else { "closed".red() }
            );
        }
        None => println!("Case {} not found.", args.case),
    }
    Ok(())
}

async fn cmd_is_police(config: &CliConfig, args: IsPoliceArgs) -> anyhow::Result<()> {
    let account = match &args.account {
        Some(raw) => Address::from_str(raw)
            .with_context(|| format!("invalid account address {raw:?}"))?,
        None => connected_session(config).await?.1.account,
    };
    if gateway(config)?.is_police(account).await? {
        println!("{} {} holds the police role", "✓".green(), account);
    } else {
        println!("{} {} does not hold the police role", "✗".red(), account);
    }
    Ok(())
}

async fn cmd_fetch(config: &CliConfig, args: FetchArgs) -> anyhow::Result<()> {
    let client = StorageClient::new(config.storage.clone())?;
    let cid = Cid::new(&args.cid)?;
    let fetched = client.fetch(&cid).await?;
    match (&args.output, fetched) {
        (Some(path), FetchedEvidence::Binary(bytes)) => {
            fs::write(path, &bytes)?;
            println!("{} {} bytes written to {}", "✓".green(), bytes.len(), path.display());
        }
        (Some(path), FetchedEvidence::Text(text)) => {
            fs::write(path, &text)?;
            println!("{} written to {}", "✓".green(), path.display());
        }
        (Some(path), FetchedEvidence::Json(value)) => {
            fs::write(path, serde_json::to_vec_pretty(&value)?)?;
            println!("{} written to {}", "✓".green(), path.display());
        }
        (None, FetchedEvidence::Text(text)) => println!("{text}"),
        (None, FetchedEvidence::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        (None, FetchedEvidence::Binary(bytes)) => {
            println!(
                "{} bytes of binary evidence; use {} to save them",
                bytes.len(),
                "--output".bold()
            );
        }
    }
    Ok(())
}

async fn cmd_account(config: &CliConfig, args: AccountArgs) -> anyhow::Result<()> {
    let session = build_session(config)?;
    if args.disconnect {
        session.disconnect().await?;
        println!("{} Disconnected.", "✓".green());
        return Ok(());
    }
    let (current, resumed) = match session.try_resume().await? {
        Some(current) => (current, true),
        None => (session.connect().await?, false),
    };
    println!(
        "{} {}",
        "✓".green().bold(),
        if resumed { "Session resumed" } else { "Connected" }
    );
    println!("  Account:  {}", current.account);
    println!("  Chain id: {}", current.chain_id);
    Ok(())
}
