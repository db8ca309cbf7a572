//! Device capability profiles
//!
//! A [`DeviceProfile`] answers the two questions the rest of the workspace
//! asks about hardware: is the target a wide-SIMT device, and how many
//! execution units can be in flight at once. It is probed once and then
//! passed around by reference; nothing re-queries the hardware per call.

use crate::error::{BackendError, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Upper bound on team size for wide-SIMT launches
pub const DEFAULT_MAX_TEAM_SIZE: usize = 128;

/// Execution backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// A single execution unit
    Serial,
    /// A multi-core host running one OS thread per execution unit
    Threads,
    /// A wide-SIMT (GPU-like) device
    Simt,
}

impl DeviceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Serial => "serial",
            DeviceKind::Threads => "threads",
            DeviceKind::Simt => "simt",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(DeviceKind::Serial),
            "threads" | "cpu" | "openmp" => Ok(DeviceKind::Threads),
            "simt" | "gpu" => Ok(DeviceKind::Simt),
            other => Err(BackendError::invalid_device(format!("unknown device kind '{other}'"))),
        }
    }
}

/// Static description of an execution backend
///
/// # Example
///
/// ```rust
/// use cohort_backends::DeviceProfile;
///
/// let gpu = DeviceProfile::simt(80 * 2048);
/// assert!(gpu.is_wide_simt());
/// assert_eq!(gpu.max_team_size(), 128);
///
/// let host = DeviceProfile::threads(8).with_mimic_simt(true);
/// assert!(!host.is_wide_simt());
/// assert!(host.mimic_simt());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceProfile {
    kind: DeviceKind,
    concurrency: usize,
    pack_width: usize,
    max_team_size: usize,
    mimic_simt: bool,
}

impl DeviceProfile {
    /// One execution unit, teams of one
    pub fn serial() -> Self {
        Self {
            kind: DeviceKind::Serial,
            concurrency: 1,
            pack_width: 1,
            max_team_size: 1,
            mimic_simt: false,
        }
    }

    /// Multi-core host with `concurrency` execution units (at least one)
    pub fn threads(concurrency: usize) -> Self {
        Self {
            kind: DeviceKind::Threads,
            concurrency: concurrency.max(1),
            pack_width: 1,
            max_team_size: DEFAULT_MAX_TEAM_SIZE,
            mimic_simt: false,
        }
    }

    /// Wide-SIMT device with `concurrency` resident execution units (at least one)
    pub fn simt(concurrency: usize) -> Self {
        Self {
            kind: DeviceKind::Simt,
            concurrency: concurrency.max(1),
            pack_width: 1,
            max_team_size: DEFAULT_MAX_TEAM_SIZE,
            mimic_simt: false,
        }
    }

    /// Probe the host this process runs on
    pub fn detect() -> Self {
        let concurrency = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let profile = Self::threads(concurrency);
        tracing::debug!(kind = %profile.kind, concurrency, "device profile detected");
        profile
    }

    /// Probe the host, then apply environment overrides
    ///
    /// # Environment Variables
    ///
    /// - `COHORT_DEVICE` - `serial`, `threads`, or `simt`
    /// - `COHORT_CONCURRENCY` - total execution units
    /// - `COHORT_PACK_WIDTH` - scalars per pack
    /// - `COHORT_MIMIC_SIMT` - `1`/`true`/`yes` to size host teams like a SIMT device
    pub fn from_env() -> Result<Self> {
        let mut profile = Self::detect();

        if let Some(kind) = read_var("COHORT_DEVICE") {
            let concurrency = profile.concurrency;
            profile = match kind.parse::<DeviceKind>()? {
                DeviceKind::Serial => Self::serial(),
                DeviceKind::Threads => Self::threads(concurrency),
                DeviceKind::Simt => Self::simt(concurrency),
            };
        }

        if let Some(raw) = read_var("COHORT_CONCURRENCY") {
            let concurrency = parse_positive("COHORT_CONCURRENCY", &raw)?;
            if profile.kind == DeviceKind::Serial && concurrency != 1 {
                return Err(BackendError::invalid_device("serial devices have exactly one execution unit"));
            }
            profile.concurrency = concurrency;
        }

        if let Some(raw) = read_var("COHORT_PACK_WIDTH") {
            profile.pack_width = parse_positive("COHORT_PACK_WIDTH", &raw)?;
        }

        if let Some(raw) = read_var("COHORT_MIMIC_SIMT") {
            profile.mimic_simt = parse_flag("COHORT_MIMIC_SIMT", &raw)?;
        }

        tracing::debug!(profile = %profile, "device profile resolved from environment");
        Ok(profile)
    }

    /// Scalars per pack used when scaling inner work into team lanes
    pub fn with_pack_width(mut self, pack_width: usize) -> Self {
        self.pack_width = pack_width.max(1);
        self
    }

    /// Cap applied by the default team-size heuristic
    pub fn with_max_team_size(mut self, max_team_size: usize) -> Self {
        self.max_team_size = max_team_size.max(1);
        self
    }

    /// Size host teams as if the device were wide-SIMT. Test scaffolding for
    /// exercising barrier and broadcast paths on a multi-core host.
    pub fn with_mimic_simt(mut self, mimic_simt: bool) -> Self {
        self.mimic_simt = mimic_simt;
        self
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_wide_simt(&self) -> bool {
        self.kind == DeviceKind::Simt
    }

    /// Total execution units that can run at the same time
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn pack_width(&self) -> usize {
        self.pack_width
    }

    pub fn max_team_size(&self) -> usize {
        self.max_team_size
    }

    pub fn mimic_simt(&self) -> bool {
        self.mimic_simt
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(units={}, pack={}, max_team={}{})",
            self.kind,
            self.concurrency,
            self.pack_width,
            self.max_team_size,
            if self.mimic_simt { ", mimic-simt" } else { "" }
        )
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(BackendError::invalid_device(format!("{key} must be a positive integer, got '{raw}'"))),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BackendError::invalid_device(format!("{key} must be a boolean, got '{raw}'"))),
    }
}
