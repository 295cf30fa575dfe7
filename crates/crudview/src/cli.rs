//! Clap derive structures for the `crudview` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// crudview -- command-line client for CRUD entity endpoints
#[derive(Debug, Parser)]
#[command(
    name = "crudview",
    version,
    about = "Query and edit records of a CRUD entity endpoint",
    long_about = "Talks to one entity endpoint per profile using the verb-style routes\n\
        (create, read, update, delete, list, find, select, ...) and renders the\n\
        records it gets back.",
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
    /// Endpoint profile to use
    #[arg(long, short = 'p', env = "CRUDVIEW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Entity endpoint URL (overrides profile)
    #[arg(long, short = 'u', env = "CRUDVIEW_BASE_URI", global = true)]
    pub base_uri: Option<String>,

    /// Anti-forgery token sent with every request
    #[arg(long, env = "CRUDVIEW_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CRUDVIEW_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CRUDVIEW_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "CRUDVIEW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one record key per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a page of records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Search records by keyword
    Find(FindArgs),

    /// List the records belonging to a master key
    Select(SelectArgs),

    /// Read one record by key
    Read(KeyArgs),

    /// Fetch with the generic `get` route
    Get(KeyArgs),

    /// Fetch with the generic `post` route
    Post(PostArgs),

    /// Create a record
    Create(WriteArgs),

    /// Update a record
    Update(WriteArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Print the server's context path
    ContextPath,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Paging Arguments ──────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Records per page (defaults to the profile's page size)
    #[arg(long, short = 'l')]
    pub size: Option<u32>,

    /// Address the route with path segments (GET) instead of a JSON query
    #[arg(long)]
    pub get: bool,

    /// Resource segment to call instead of the verb's own
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub paging: PageArgs,

    /// Filter keyword
    #[arg(long, short = 'f')]
    pub keyword: Option<String>,

    /// Fetch every record (`listAll`) instead of one page
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Keyword to search for
    pub keyword: String,

    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Master record key
    pub key: String,

    #[command(flatten)]
    pub paging: PageArgs,

    /// Use the `selectList` route
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Record key
    pub key: String,

    /// Resource segment to call instead of the verb's own
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct PostArgs {
    /// Key sent as the body when no data is given
    pub key: Option<String>,

    #[command(flatten)]
    pub data: DataArgs,

    /// Resource segment to call instead of the verb's own
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct DataArgs {
    /// Record content as inline JSON
    #[arg(long, short = 'd', conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read record content from a JSON file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Attach a file (sent as multipart with the record as `data`)
    #[arg(long)]
    pub upload: Option<PathBuf>,

    /// Resource segment to call instead of the verb's own
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Resource segment to call instead of the verb's own
    #[arg(long)]
    pub target: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the loaded configuration (tokens redacted)
    Show,

    /// Print the config file path
    Path,

    /// Add or replace a profile
    SetProfile {
        /// Profile name
        name: String,

        /// Entity endpoint URL
        #[arg(long)]
        base_uri: String,

        /// Records per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Store a profile's token in the system keyring
    SetToken {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,

        /// Token value
        token: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
