//! Clap derive structures for the `umbrelly` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of workspace crates so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// umbrelly -- monitor and control an umbrelOS home server
#[derive(Debug, Parser)]
#[command(
    name = "umbrelly",
    version,
    about = "Monitor and control umbrelOS home servers from the command line",
    long_about = "Polls an umbrelOS host over its tRPC API and exposes system health,\n\
        installed apps, external storage and updates as sensors, switches,\n\
        buttons and update entities.",
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
    /// Host profile to use
    #[arg(long, short = 'p', env = "UMBRELLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// umbrelOS host, e.g. umbrel.local or http://10.0.0.5 (overrides profile)
    #[arg(long, short = 'H', env = "UMBRELLY_HOST", global = true)]
    pub host: Option<String>,

    /// Login password
    #[arg(
        long,
        env = "UMBRELLY_PASSWORD",
        global = true,
        hide = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "UMBRELLY_OUTPUT",
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

    /// Accept self-signed TLS certificates (the umbrelOS default)
    #[arg(long, short = 'k', env = "UMBRELLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: 20]
    #[arg(long, env = "UMBRELLY_TIMEOUT", global = true)]
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
    /// Plain text, one value per line (scripting)
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
    /// Show system health, update and security status
    #[command(alias = "st")]
    Status,

    /// List and control installed apps
    #[command(alias = "a")]
    Apps(AppsArgs),

    /// Reboot, shut down or update the host
    #[command(alias = "sys")]
    System(SystemArgs),

    /// List external storage devices
    Storage,

    /// List every entity with its current state
    #[command(alias = "ent")]
    Entities(EntitiesArgs),

    /// Poll the host and print one line per refresh until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List installed apps
    #[command(alias = "ls")]
    List,

    /// Show the live lifecycle state of one app
    State {
        /// App ID (e.g. "nextcloud")
        app: String,
    },

    /// Start an app
    Start {
        /// App ID
        app: String,
    },

    /// Stop an app
    Stop {
        /// App ID
        app: String,
    },

    /// Restart an app
    Restart {
        /// App ID
        app: String,
    },

    /// Update (or reinstall) an app
    Update {
        /// App ID
        app: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYSTEM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Reboot the host
    Reboot,

    /// Shut down the host
    Shutdown,

    /// Install the available umbrelOS update
    Update {
        /// Follow update progress until it finishes
        #[arg(long, short = 'w')]
        wait: bool,
    },

    /// Ask the host to look for an umbrelOS update
    CheckUpdate,

    /// Show progress of a running umbrelOS update
    UpdateStatus,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENTITIES / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// Only show entities of this platform
    #[arg(long, short = 't')]
    pub platform: Option<PlatformFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformFilter {
    Sensor,
    BinarySensor,
    Switch,
    Button,
    Update,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Exit after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

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

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key: host, password_env, insecure, timeout, refresh_interval, ca_cert
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

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
