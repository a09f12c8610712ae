use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Hard upper bound on the column proportion table. Anything past this makes
/// columns unusably narrow even on ultrawide displays.
const MAX_COLUMNS: usize = 8;

pub fn config_file() -> PathBuf { dirs::home_dir().unwrap().join(".trellis.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Tiling configuration consumed by the layout engine
    #[serde(default)]
    pub tiling: TilingSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TilingSettings {
    /// Column count a freshly created (or reset) layout starts with
    #[serde(default = "default_columns")]
    pub columns_default: usize,
    /// Largest column count a user can request; also the length of the
    /// column proportion table
    #[serde(default = "default_columns_max")]
    pub columns_max: usize,
    /// Desktop width in pixels above which more than 2 columns are permitted
    #[serde(default = "default_ultrawide_threshold")]
    pub ultrawide_threshold: i32,
    /// Pixel spacing between and around tiled windows
    #[serde(default = "default_gap")]
    pub gap: i32,
    /// Smallest fractional share a column (or resized split) may hold
    #[serde(default = "default_proportion_min")]
    pub proportion_min: f64,
    /// Amount one grow/shrink command moves a column proportion by
    #[serde(default = "default_proportion_step")]
    pub proportion_step: f64,
    /// Baseline master share of the legacy master/slave split
    #[serde(default = "default_master_split")]
    pub master_split: f64,
    /// Master capacity a freshly created pool starts with
    #[serde(default = "default_masters")]
    pub masters_default: usize,
    /// Largest master capacity `increase_master` will grow to
    #[serde(default = "default_masters_max")]
    pub masters_max: usize,
    /// Slave capacity a freshly created pool starts with
    #[serde(default = "default_slaves")]
    pub slaves_default: usize,
    /// Largest slave capacity `increase_slave` will grow to
    #[serde(default = "default_slaves_max")]
    pub slaves_max: usize,
}

impl Default for TilingSettings {
    fn default() -> Self {
        Self {
            columns_default: default_columns(),
            columns_max: default_columns_max(),
            ultrawide_threshold: default_ultrawide_threshold(),
            gap: default_gap(),
            proportion_min: default_proportion_min(),
            proportion_step: default_proportion_step(),
            master_split: default_master_split(),
            masters_default: default_masters(),
            masters_max: default_masters_max(),
            slaves_default: default_slaves(),
            slaves_max: default_slaves_max(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> { self.tiling.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.tiling.auto_fix_values() }
}

impl TilingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.columns_max == 0 || self.columns_max > MAX_COLUMNS {
            issues.push(format!(
                "columns_max must be between 1 and {}, got {}",
                MAX_COLUMNS, self.columns_max
            ));
        }

        if self.columns_default == 0 || self.columns_default > self.columns_max {
            issues.push(format!(
                "columns_default must be between 1 and columns_max ({}), got {}",
                self.columns_max, self.columns_default
            ));
        }

        if self.ultrawide_threshold <= 0 {
            issues.push(format!(
                "ultrawide_threshold must be positive, got {}",
                self.ultrawide_threshold
            ));
        }

        if self.gap < 0 {
            issues.push(format!("gap must be non-negative, got {}", self.gap));
        }

        if !(self.proportion_min > 0.0 && self.proportion_min < 0.5) {
            issues.push(format!(
                "proportion_min must be in (0, 0.5), got {}",
                self.proportion_min
            ));
        }

        if !(self.proportion_step > 0.0 && self.proportion_step < 0.5) {
            issues.push(format!(
                "proportion_step must be in (0, 0.5), got {}",
                self.proportion_step
            ));
        }

        if !(self.master_split > 0.0 && self.master_split < 1.0) {
            issues.push(format!(
                "master_split must be in (0, 1), got {}",
                self.master_split
            ));
        }

        if self.masters_default == 0 || self.masters_default > self.masters_max {
            issues.push(format!(
                "masters_default must be between 1 and masters_max ({}), got {}",
                self.masters_max, self.masters_default
            ));
        }

        if self.slaves_default == 0 || self.slaves_default > self.slaves_max {
            issues.push(format!(
                "slaves_default must be between 1 and slaves_max ({}), got {}",
                self.slaves_max, self.slaves_default
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.columns_max == 0 || self.columns_max > MAX_COLUMNS {
            self.columns_max = default_columns_max();
            fixes += 1;
        }

        if self.columns_default == 0 || self.columns_default > self.columns_max {
            self.columns_default = self.columns_max.min(default_columns());
            fixes += 1;
        }

        if self.ultrawide_threshold <= 0 {
            self.ultrawide_threshold = default_ultrawide_threshold();
            fixes += 1;
        }

        if self.gap < 0 {
            self.gap = 0;
            fixes += 1;
        }

        if !(self.proportion_min > 0.0 && self.proportion_min < 0.5) {
            self.proportion_min = default_proportion_min();
            fixes += 1;
        }

        if !(self.proportion_step > 0.0 && self.proportion_step < 0.5) {
            self.proportion_step = default_proportion_step();
            fixes += 1;
        }

        if !(self.master_split > 0.0 && self.master_split < 1.0) {
            self.master_split = default_master_split();
            fixes += 1;
        }

        if self.masters_default == 0 || self.masters_default > self.masters_max {
            self.masters_default = self.masters_max.max(1).min(default_masters());
            self.masters_max = self.masters_max.max(self.masters_default);
            fixes += 1;
        }

        if self.slaves_default == 0 || self.slaves_default > self.slaves_max {
            self.slaves_default = self.slaves_max.max(1).min(default_slaves());
            self.slaves_max = self.slaves_max.max(self.slaves_default);
            fixes += 1;
        }

        fixes
    }
}

fn default_columns() -> usize { 2 }

fn default_columns_max() -> usize { 4 }

fn default_ultrawide_threshold() -> i32 { 2560 }

fn default_gap() -> i32 { 10 }

fn default_proportion_min() -> f64 { 0.1 }

fn default_proportion_step() -> f64 { 0.05 }

fn default_master_split() -> f64 { 0.6 }

fn default_masters() -> usize { 1 }

fn default_masters_max() -> usize { 3 }

fn default_slaves() -> usize { 2 }

fn default_slaves_max() -> usize { 3 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config { Self::parse(include_str!("../../trellis.default.toml")).unwrap() }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }
}
