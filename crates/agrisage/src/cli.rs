//! Clap derive structures for the `agrisage` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// agrisage -- farm advisory from the command line
#[derive(Debug, Parser)]
#[command(
    name = "agrisage",
    version,
    about = "Farm advisory from the command line",
    long_about = "Manage farms and crops, read weather and recommendations, \
        and run crop disease detection against an agrisage advisory server.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "AGRISAGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "AGRISAGE_SERVER", global = true)]
    pub server: Option<String>,

    /// Where the session token is kept (overrides profile)
    #[arg(long, env = "AGRISAGE_TOKEN_STORE", value_enum, global = true)]
    pub token_store: Option<TokenStoreArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AGRISAGE_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "AGRISAGE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AGRISAGE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TokenStoreArg {
    /// System keyring
    Keyring,
    /// Token file under the data directory
    File,
    /// Keep the token for this process only
    Memory,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SoilArg {
    Sandy,
    Loamy,
    Clay,
    Silty,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageArg {
    Seedling,
    Vegetative,
    Flowering,
    Fruiting,
    Harvesting,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session token
    Login(LoginArgs),

    /// Sign out and forget the stored token
    Logout,

    /// Create a farmer account
    Register(RegisterArgs),

    /// Show the signed-in farmer
    Whoami,

    /// Totals across all farms, or quick stats for one farm
    #[command(alias = "dash")]
    Overview(OverviewArgs),

    /// Manage farms
    #[command(alias = "f")]
    Farms(FarmsArgs),

    /// Manage crops on a farm
    #[command(alias = "c")]
    Crops(CropsArgs),

    /// Current weather and forecasts for a farm
    #[command(alias = "w")]
    Weather(WeatherArgs),

    /// Stored recommendations for a farm
    #[command(alias = "recs")]
    Recommendations(RecommendationsArgs),

    /// Irrigation and fertilizer advice for a crop
    Advice(AdviceArgs),

    /// Crop disease detection
    Disease(DiseaseArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Account ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long)]
    pub email: String,

    /// Phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Town or region
    #[arg(long, default_value = "")]
    pub location: String,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Farms ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FarmsArgs {
    #[command(subcommand)]
    pub command: FarmsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FarmsCommand {
    /// List your farms
    #[command(alias = "ls")]
    List,

    /// Show one farm with its crops
    Get {
        /// Farm ID
        id: i64,
    },

    /// Register a new farm
    Create(FarmFields),

    /// Replace a farm's details
    Update {
        /// Farm ID
        id: i64,

        #[command(flatten)]
        fields: FarmFields,
    },
}

#[derive(Debug, Args)]
pub struct FarmFields {
    /// Farm name
    #[arg(long)]
    pub name: String,

    /// Total size in acres
    #[arg(long)]
    pub size: f64,

    /// Soil type
    #[arg(long, value_enum)]
    pub soil: SoilArg,

    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,
}

// ── Crops ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CropsArgs {
    #[command(subcommand)]
    pub command: CropsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CropsCommand {
    /// List crops planted on a farm
    #[command(alias = "ls")]
    List {
        /// Farm ID
        farm: i64,
    },

    /// Plant a crop, then show the farm's updated crop list
    Create {
        /// Farm ID
        farm: i64,

        /// Crop name
        #[arg(long)]
        name: String,

        /// Planting date (YYYY-MM-DD)
        #[arg(long)]
        planted: String,

        /// Expected harvest date (YYYY-MM-DD)
        #[arg(long)]
        harvest: Option<String>,

        /// Current growth stage
        #[arg(long, value_enum, default_value = "seedling")]
        stage: StageArg,

        /// Planted area in acres
        #[arg(long)]
        area: f64,
    },
}

// ── Weather ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WeatherArgs {
    #[command(subcommand)]
    pub command: WeatherCommand,
}

#[derive(Debug, Subcommand)]
pub enum WeatherCommand {
    /// Current conditions at a farm
    Current {
        /// Farm ID
        farm: i64,
    },

    /// Multi-day forecast for a farm
    Forecast {
        /// Farm ID
        farm: i64,

        /// Days ahead (1-5)
        #[arg(long, short = 'd', default_value = "5")]
        days: u8,
    },
}

// ── Overview ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OverviewArgs {
    /// Show crop, recommendation and temperature stats for this farm
    #[arg(long)]
    pub farm: Option<i64>,
}

// ── Recommendations ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RecommendationsArgs {
    #[command(subcommand)]
    pub command: RecommendationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecommendationsCommand {
    /// List a farm's recommendations, most urgent first
    #[command(alias = "ls")]
    List {
        /// Farm ID
        farm: i64,
    },
}

// ── Advice ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AdviceArgs {
    #[command(subcommand)]
    pub command: AdviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdviceCommand {
    /// Watering advice for a crop
    Irrigation {
        /// Farm ID
        farm: i64,
        /// Crop ID
        crop: i64,
    },

    /// Fertilizer advice for a crop
    Fertilizer {
        /// Farm ID
        farm: i64,
        /// Crop ID
        crop: i64,
    },
}

// ── Disease ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiseaseArgs {
    #[command(subcommand)]
    pub command: DiseaseCommand,
}

#[derive(Debug, Subcommand)]
pub enum DiseaseCommand {
    /// Upload a crop photo for classification
    Detect {
        /// Farm ID
        farm: i64,
        /// Crop ID
        crop: i64,
        /// Image file (JPEG or PNG)
        image: PathBuf,
    },

    /// Past detections on a farm
    History {
        /// Farm ID
        farm: i64,
    },
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

    /// Display current configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
