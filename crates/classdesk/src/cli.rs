//! Clap derive structures for the `classdesk` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use classdesk_core::{OperationKind, ResourceKind};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// classdesk -- admin dashboard API from the command line
#[derive(Debug, Parser)]
#[command(
    name = "classdesk",
    version,
    about = "Read and manage Classdesk admin dashboard resources",
    long_about = "Reads teachers, groups, units, unit content and reservations from the\n\
        admin API and runs write operations against them.\n\n\
        Sign in once with `classdesk login`; the session is persisted per profile.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "CLASSDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "CLASSDESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Session file (overrides profile)
    #[arg(long, env = "CLASSDESK_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CLASSDESK_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CLASSDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CLASSDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist the session
    Login(LoginArgs),

    /// Drop the persisted session
    Logout,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Show whether a session is active
    Status,

    /// Read a resource
    #[command(alias = "get")]
    Read(ReadArgs),

    /// Run a write operation
    #[command(alias = "exec")]
    Run(RunArgs),

    /// List readable resources and write operations
    Resources,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login email (overrides profile)
    #[arg(long, short = 'e', env = "CLASSDESK_EMAIL")]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,

    /// Store the password in the system keyring after a successful login
    #[arg(long)]
    pub remember: bool,

    /// Save the base URL and email into the profile after a successful login
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Resource kind (e.g. teachers, unitVideos)
    pub resource: ResourceKind,

    /// Id the resource is keyed by (e.g. the unit detail id)
    pub param: Option<String>,

    /// Print every state transition, not just the settled data
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Operation (e.g. deleteTeacher, addVideo)
    pub operation: OperationKind,

    /// Id of the record the operation targets
    #[arg(long, short = 't')]
    pub target: Option<String>,

    /// JSON object payload
    #[arg(long, short = 'd', conflicts_with = "payload_file")]
    pub payload: Option<String>,

    /// Read the JSON payload from a file
    #[arg(long, short = 'f')]
    pub payload_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
