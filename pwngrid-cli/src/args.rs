//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;
use pwngrid_core::{Channel, Error, GridConfig, MacAddr, OperatingMode, Result, TargetScope};

#[derive(Parser, Debug)]
#[command(name = "pwngrid")]
#[command(version, about = "Replay monitor-mode captures through the pwngrid engine", long_about = None)]
pub struct Cli {
    /// Capture file to replay (radiotap or bare 802.11 pcap)
    #[arg(short = 'r', long, value_name = "PCAP")]
    pub read: PathBuf,

    /// Operating mode: friendly, normal or aggressive
    #[arg(short = 'm', long, default_value = "normal")]
    pub mode: OperatingMode,

    /// Directory receiving friends.ndjson and packets.ndjson
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Authorized target BSSID (repeatable)
    #[arg(short = 'B', long = "bssid", value_name = "MAC")]
    pub bssids: Vec<MacAddr>,

    /// Authorized target SSID (repeatable)
    #[arg(short = 'S', long = "ssid", value_name = "SSID")]
    pub ssids: Vec<String>,

    /// Channel assumed when the capture carries none, and used for transmit cycles
    #[arg(short = 'c', long, default_value = "1")]
    pub channel: u8,

    /// Device name announced to peers
    #[arg(short = 'n', long, default_value = "pwngrid")]
    pub name: String,

    /// One lure per this many matching frames (aggressive mode)
    #[arg(long, value_name = "N", default_value = "100")]
    pub lure_rate: u32,

    /// Run one advertisement after the replay
    #[arg(long)]
    pub advertise: bool,

    /// Run one deauthentication cycle after the replay
    #[arg(long)]
    pub deauth: bool,

    /// Print final statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default filter directive when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn channel(&self) -> Result<Channel> {
        Channel::try_from(self.channel)
    }

    /// Networks the operator listed as authorized
    pub fn scope(&self) -> TargetScope {
        let scope = self
            .bssids
            .iter()
            .fold(TargetScope::new(), |scope, bssid| scope.with_bssid(*bssid));
        self.ssids
            .iter()
            .fold(scope, |scope, ssid| scope.with_ssid(ssid.clone()))
    }

    /// Engine configuration built from the arguments
    pub fn config(&self) -> Result<GridConfig> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_parameter("name", "must not be blank"));
        }
        let config = GridConfig {
            device_name: self.name.clone(),
            mode: self.mode,
            lure_rate: self.lure_rate,
            scope: self.scope(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}
