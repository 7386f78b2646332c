//! Configuration for the HNAS hooks.
//!
//! The backup tool passes everything through the process environment. A
//! `.env` file in the working directory is honoured for manual runs.

use crate::utils::{HookError, Result};
use std::path::PathBuf;

/// Username that switches authentication to the `X-Api-Key` header.
pub const API_KEY_USERNAME: &str = "apikey";

const DEFAULT_PORT: u16 = 8444;
const DEFAULT_SEARCH_TAG: &str = "veeam";
const DEFAULT_SHARE_PREFIX: &str = "VeeamNASBackup";
const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Settings shared by both phases.
#[derive(Debug, Clone)]
pub struct Config {
    /// Array management host name or address
    pub host: String,

    /// Management API port
    pub port: u16,

    pub username: String,

    /// Password, or the API key when `username` is `apikey`
    pub password: String,

    /// Verify the array's TLS certificate
    pub verify_ssl: bool,

    pub log_dir: PathBuf,
    pub log_level: String,

    /// Location of the pre/post hand-off manifest
    pub manifest_path: PathBuf,

    /// `appSearchId` grouping this tool's snapshots; `None` when configured empty
    pub search_tag: Option<String>,

    /// Prefix of the SMB share names created for snapshots
    pub share_prefix: String,
}

/// Pre-backup settings.
#[derive(Debug, Clone)]
pub struct PreConfig {
    pub common: Config,

    /// Filesystem IDs or labels to snapshot, in order
    pub filesystems: Vec<String>,

    /// Array-native retention interval attached to new snapshots.
    /// Unrelated to the post-backup sweep window.
    pub retention_interval: Option<u32>,

    pub create_smb_share: bool,
}

/// Post-backup settings.
#[derive(Debug, Clone)]
pub struct PostConfig {
    pub common: Config,

    pub job_result: Option<String>,
    pub session_result: Option<String>,

    pub cleanup_on_success: bool,
    pub cleanup_on_failure: bool,

    /// Age window of the retention sweep; 0 disables the sweep
    pub retention_days: u32,

    /// Filesystems swept when no manifest entries are available
    pub fallback_filesystems: Vec<String>,
}

fn default_log_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\VeeamScripts\Logs")
    } else {
        PathBuf::from("/var/log/hnas-veeam")
    }
}

fn default_manifest_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\VeeamScripts\hnas_snapshot_info.json")
    } else {
        PathBuf::from("/var/lib/hnas-veeam/hnas_snapshot_info.json")
    }
}

/// Reads typed values out of a variable lookup.
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        match self.string(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(HookError::Config(format!("{} is not set", key))),
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.string(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn number<N: std::str::FromStr>(&self, key: &str, default: N) -> Result<N> {
        match self.string(key) {
            Some(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| HookError::Config(format!("{} must be a number, got '{}'", key, v))),
            _ => Ok(default),
        }
    }

    /// A signed count where zero or below means "off".
    fn positive(&self, key: &str, default: i64) -> Result<Option<u32>> {
        let value: i64 = self.number(key, default)?;
        if value <= 0 {
            return Ok(None);
        }
        u32::try_from(value)
            .map(Some)
            .map_err(|_| HookError::Config(format!("{} is too large, got {}", key, value)))
    }

    fn list(&self, key: &str) -> Vec<String> {
        parse_list(&self.string(key).unwrap_or_default())
    }
}

/// Split a comma separated list, dropping blank items.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_vars<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        Self::read(&Vars { lookup })
    }

    fn read<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self> {
        let search_tag = vars.string_or("HNAS_APP_SEARCH_ID", DEFAULT_SEARCH_TAG);

        Ok(Self {
            host: vars.required("HNAS_HOST")?,
            port: vars.number("HNAS_PORT", DEFAULT_PORT)?,
            username: vars.required("HNAS_USERNAME")?,
            password: vars.required("HNAS_PASSWORD")?,
            verify_ssl: vars.flag("HNAS_VERIFY_SSL", false),
            log_dir: vars
                .string("VEEAM_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_log_dir),
            log_level: vars.string_or("LOG_LEVEL", "info"),
            manifest_path: vars
                .string("VEEAM_SNAPSHOT_INFO")
                .map(PathBuf::from)
                .unwrap_or_else(default_manifest_path),
            search_tag: Some(search_tag.trim().to_string()).filter(|t| !t.is_empty()),
            share_prefix: vars.string_or("HNAS_SMB_SHARE_NAME", DEFAULT_SHARE_PREFIX),
        })
    }

    /// `https://{host}:{port}/v9/storage`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/v9/storage", self.host, self.port)
    }
}

impl PreConfig {
    /// Load the pre-backup configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let vars = Vars { lookup };
        let common = Config::read(&vars)?;

        let filesystems = vars.list("HNAS_FILESYSTEMS");
        if filesystems.is_empty() {
            return Err(HookError::Config(
                "HNAS_FILESYSTEMS is not set (comma-separated filesystem names or IDs)".into(),
            ));
        }

        Ok(Self {
            common,
            filesystems,
            retention_interval: vars.positive("HNAS_RETENTION_INTERVAL", 0)?,
            create_smb_share: vars.flag("HNAS_CREATE_SMB_SHARE", true),
        })
    }
}

impl PostConfig {
    /// Load the post-backup configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let vars = Vars { lookup };
        let common = Config::read(&vars)?;

        Ok(Self {
            common,
            job_result: vars.string("VEEAM_JOB_RESULT"),
            session_result: vars.string("VEEAM_SESSION_RESULT"),
            cleanup_on_success: vars.flag("HNAS_CLEANUP_ON_SUCCESS", false),
            cleanup_on_failure: vars.flag("HNAS_CLEANUP_ON_FAILURE", true),
            retention_days: vars
                .positive("HNAS_RETENTION_DAYS", i64::from(DEFAULT_RETENTION_DAYS))?
                .unwrap_or(0),
            fallback_filesystems: vars.list("HNAS_FILESYSTEMS"),
        })
    }
}
