//! Clap derive structures for the `homeai` CLI.
//!
//! Only depends on clap + clap_complete so build.rs can include it for
//! man page generation.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// homeai -- one command line for every smart-home backend
#[derive(Debug, Parser)]
#[command(
    name = "homeai",
    version,
    about = "Control smart-home devices from the command line",
    long_about = "Aggregates devices from Home Assistant, MQTT (Tasmota and Zigbee2MQTT),\n\
        and SmartThings into one catalog you can list, control, and chat with.\n\n\
        Without any configured backend the demonstration catalog is served.",
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
    /// Home profile to use
    #[arg(long, short = 'p', env = "HOMEAI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HOMEAI_OUTPUT",
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
    #[arg(long, env = "HOMEAI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Skip every backend and serve the demonstration catalog
    #[arg(long, global = true)]
    pub demo: bool,
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
    /// List, inspect, and control devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show backend connectivity and the last refresh outcome
    Status,

    /// Test connectivity to one backend from the active profile
    Test(TestArgs),

    /// Talk to the assistant in plain language
    Chat(ChatArgs),

    /// Print catalog snapshots as they change (Ctrl-C to stop)
    Watch,

    /// Manage configuration profiles and secrets
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices in the catalog
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show one device
    Get {
        /// Device identifier
        device: String,
    },

    /// Turn a device on
    On {
        /// Device identifier
        device: String,
    },

    /// Turn a device off
    Off {
        /// Device identifier
        device: String,
    },

    /// Lock a lock
    Lock {
        /// Device identifier
        device: String,
    },

    /// Unlock a lock
    Unlock {
        /// Device identifier
        device: String,
    },

    /// Set light brightness (percent)
    Brightness {
        /// Device identifier
        device: String,
        /// Brightness, 0-100 (values outside are clamped)
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },

    /// Set a thermostat's target temperature (°F)
    Temperature {
        /// Device identifier
        device: String,
        /// Target temperature in °F
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Only devices in this room (case-insensitive)
    #[arg(long, short = 'r')]
    pub room: Option<String>,

    /// Only devices of this type (light, switch, thermostat, lock, ...)
    #[arg(long = "type", short = 't')]
    pub device_type: Option<String>,

    /// Only devices from this integration (home_assistant, mqtt, smartthings, ...)
    #[arg(long, short = 'i')]
    pub integration: Option<String>,
}

// ── Test ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TestArgs {
    #[command(subcommand)]
    pub target: TestTarget,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum TestTarget {
    /// Home Assistant REST API
    #[command(alias = "hass")]
    HomeAssistant,
    /// MQTT broker
    Mqtt,
    /// SmartThings cloud API
    #[command(alias = "st")]
    Smartthings,
}

// ── Chat ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Message for the assistant, e.g. "turn off the kitchen light"
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    pub message: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Store a secret in the system keyring for the active profile
    SetSecret {
        /// Which secret to store
        secret: SecretKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretKind {
    /// Home Assistant long-lived access token
    HassToken,
    /// MQTT broker password
    MqttPassword,
    /// SmartThings personal access token
    SmartthingsToken,
    /// OpenAI API key for the assistant
    OpenaiApiKey,
}

impl SecretKind {
    /// Keyring account suffix for this secret.
    pub fn account(self) -> &'static str {
        match self {
            Self::HassToken => "hass-token",
            Self::MqttPassword => "mqtt-password",
            Self::SmartthingsToken => "smartthings-token",
            Self::OpenaiApiKey => "openai-api-key",
        }
    }
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
