use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "custody",
    about = "Custody — evidence chain-of-custody client",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (default: ./custody.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Hash, upload, and record evidence against a case
    Submit(SubmitArgs),
    /// Register a new case on the chain
    CreateCase(CreateCaseArgs),
    /// Approve a piece of evidence on a case
    Approve(ApproveArgs),
    /// Link an anonymous tip to a case
    LinkTip(LinkTipArgs),
    /// Look up a case record
    GetCase(GetCaseArgs),
    /// Check whether an account holds the police role
    IsPolice(IsPoliceArgs),
    /// Retrieve stored evidence by CID
    Fetch(FetchArgs),
    /// Connect the wallet, or show the current session
    Account(AccountArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Numeric case id
    pub case: String,
    /// Evidence file to submit
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Inline text evidence
    #[arg(short, long)]
    pub text: Option<String>,
    /// Record the submission without the submitter's identity
    #[arg(long)]
    pub anonymous: bool,
    /// Reference to the encryption key used for the payload
    #[arg(long)]
    pub key_ref: Option<String>,
    /// Upload without encryption
    #[arg(long)]
    pub plain: bool,
}

#[derive(Args)]
pub struct CreateCaseArgs {
    pub case: String,
    /// Hash of the off-chain case metadata
    #[arg(long)]
    pub metadata_hash: String,
    /// Public key evidence should be encrypted to
    #[arg(long, default_value = "")]
    pub public_key: String,
}

#[derive(Args)]
pub struct ApproveArgs {
    pub case: String,
    /// Index of the evidence entry within the case
    pub index: u64,
}

#[derive(Args)]
pub struct LinkTipArgs {
    pub tip: u64,
    pub case: String,
}

#[derive(Args)]
pub struct GetCaseArgs {
    pub case: String,
}

#[derive(Args)]
pub struct IsPoliceArgs {
    /// Account to check; defaults to the session account
    pub account: Option<String>,
}

#[derive(Args)]
pub struct FetchArgs {
    pub cid: String,
    /// Write the payload here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct AccountArgs {
    /// Drop the session and the reconnect marker
    #[arg(long)]
    pub disconnect: bool,
}
