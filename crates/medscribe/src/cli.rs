//! Clap derive structures for the `medscribe` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module may
//! only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// medscribe -- entitlement checks and clinical writing assistance
#[derive(Debug, Parser)]
#[command(
    name = "medscribe",
    version,
    about = "Subscription entitlements and AI writing tools for medscribe",
    long_about = "Query subscription entitlements and free-tier limits, drive the\n\
        generative-AI and speech endpoints, and run the medscribe function server.",
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
    #[arg(long, short = 'p', env = "MEDSCRIBE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Store project URL (overrides profile)
    #[arg(long, env = "MEDSCRIBE_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MEDSCRIBE_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MEDSCRIBE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Patient,
    Consultation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanArg {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a user's subscription and entitlement verdict
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Check whether a user may create one more resource
    Gate(GateArgs),

    /// Show the configured free-tier limits
    Limits,

    /// Evaluate entitlements offline from explicit inputs
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Generate medical content from a prompt
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Write or rewrite content in a given tone
    Write(WriteArgs),

    /// Restructure a clinical note
    Enhance(EnhanceArgs),

    /// Transcribe an audio recording
    Transcribe(TranscribeArgs),

    /// Run the HTTP function server
    Serve(ServeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Entitlements ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// User id as stored in the subscriptions table
    pub user_id: String,
}

#[derive(Debug, Args)]
pub struct GateArgs {
    /// User id
    pub user_id: String,

    /// Resource the user wants to create
    pub resource: ResourceArg,
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// User id
    pub user_id: String,

    /// Subscription expiry (RFC 3339); omit for no subscription
    #[arg(long)]
    pub expires_at: Option<String>,

    /// Subscription plan
    #[arg(long, default_value = "monthly", requires = "expires_at")]
    pub plan: PlanArg,

    /// Mark the subscription inactive
    #[arg(long, requires = "expires_at")]
    pub inactive: bool,

    /// Patients the user already has
    #[arg(long, default_value = "0")]
    pub patients: u32,

    /// Consultations the user already has
    #[arg(long, default_value = "0")]
    pub consultations: u32,

    /// Evaluation instant (RFC 3339); defaults to now
    #[arg(long)]
    pub now: Option<String>,
}

// ── AI tools ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Prompt text
    pub prompt: String,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Writing instruction
    pub prompt: String,

    /// File with existing content to continue or rewrite ("-" for stdin)
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Target tone (default: professional)
    #[arg(long)]
    pub tone: Option<String>,
}

#[derive(Debug, Args)]
pub struct EnhanceArgs {
    /// File containing the note ("-" for stdin)
    pub file: PathBuf,

    /// Note structure (default: SOAP)
    #[arg(long)]
    pub note_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct TranscribeArgs {
    /// Audio file ("-" for stdin)
    pub file: PathBuf,

    /// Treat the input as base64 text instead of raw audio
    #[arg(long)]
    pub base64: bool,

    /// MIME type of raw audio input
    #[arg(long, default_value = "audio/webm", conflicts_with = "base64")]
    pub mime_type: String,
}

// ── Server ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides profile and defaults)
    #[arg(long, env = "MEDSCRIBE_BIND")]
    pub bind: Option<String>,

    /// Log line format
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (e.g., "store_url", "gemini_model", "free_patient_limit")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API key for the active profile in the system keyring
    SetKey {
        /// Upstream the key belongs to: store, gemini or speech
        credential: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
