//! Provisioning of a self-contained installation directory (`neurosignet install`).
//!
//! The installer runs a fixed sequence of [`InstallStep`]s. A step either completes, completes
//! with a warning that is carried into the [`InstallReport`], or fails and aborts the rest.
//!
//! The resulting tree looks like:
//!
//! ```text
//! <root>/
//!   bin/neurosignet          copy of the running executable
//!   config.yaml              storage pointed at <root>
//!   start.sh | start.bat     launcher
//!   uninstall.sh | .bat
//!   installation_report.json
//!   models/ logs/ uploads/ exports/ temp/ samples/ assets/
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::config::{Config, StorageConfig};

/// Directories created under the installation root
pub const LAYOUT: [&str; 7] = ["models", "logs", "uploads", "exports", "temp", "samples", "assets"];

const QUICK_START_GUIDE: &str = "\
NeuroSigNet Pro - Quick Start Guide

1. LAUNCH THE APPLICATION:
   - Run the launcher in the installation directory (start.sh or start.bat)
   - Or use the shortcut created during installation
   - Then open http://localhost:8000 in your browser

2. PROCESS YOUR FIRST DOCUMENT:
   - Choose a JPG/PNG/PDF/TIFF/BMP file with signatures or seals
   - Choose processing options
   - Click 'Analyze'

3. SUPPORTED FEATURES:
   - Signature detection
   - Seal and stamp recognition
   - Document quality enhancement
   - Batch processing

Settings live in config.yaml next to the launcher.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStep {
    Requirements,
    Layout,
    Config,
    Launcher,
    Uninstaller,
    Samples,
    Report,
}

impl InstallStep {
    pub const ALL: [InstallStep; 7] = [
        InstallStep::Requirements,
        InstallStep::Layout,
        InstallStep::Config,
        InstallStep::Launcher,
        InstallStep::Uninstaller,
        InstallStep::Samples,
        InstallStep::Report,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            InstallStep::Requirements => "Checking system requirements",
            InstallStep::Layout => "Installing main application",
            InstallStep::Config => "Writing configuration",
            InstallStep::Launcher => "Creating launcher",
            InstallStep::Uninstaller => "Creating uninstaller",
            InstallStep::Samples => "Creating sample data",
            InstallStep::Report => "Finalizing installation",
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "warning", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    CompletedWithWarnings(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: InstallStep,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// What an installation did, step by step.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub install_directory: PathBuf,
    pub launcher: PathBuf,
    pub steps: Vec<StepRecord>,
}

impl InstallReport {
    pub fn warnings(&self) -> impl Iterator<Item = (InstallStep, &str)> {
        self.steps.iter().filter_map(|record| match &record.outcome {
            StepOutcome::CompletedWithWarnings(reason) => Some((record.step, reason.as_str())),
            StepOutcome::Completed => None,
        })
    }

    /// Human readable summary printed by the CLI
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for record in &self.steps {
            match &record.outcome {
                StepOutcome::Completed => out.push_str(&format!("[ok]   {}\n", record.step)),
                StepOutcome::CompletedWithWarnings(reason) => {
                    out.push_str(&format!("[warn] {}: {}\n", record.step, reason))
                }
            }
        }
        out.push_str(&format!("\nNeuroSigNet Pro installed in {}\n", self.install_directory.display()));
        out.push_str(&format!("Start it with {}\n", self.launcher.display()));
        out.push_str("See the 'samples' folder for a quick start guide");
        out
    }
}

/// Contents of `installation_report.json`
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    installation: InstallationInfo<'a>,
    system_info: SystemInfo,
    steps: &'a [StepRecord],
}

#[derive(Debug, Serialize)]
struct InstallationInfo<'a> {
    version: &'static str,
    timestamp: DateTime<Utc>,
    install_directory: &'a Path,
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    os: &'static str,
    family: &'static str,
    arch: &'static str,
}

impl SystemInfo {
    fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            family: std::env::consts::FAMILY,
            arch: std::env::consts::ARCH,
        }
    }
}

#[derive(Debug, Builder)]
pub struct Installer {
    /// Installation root
    root: PathBuf,
    /// Base configuration; storage paths are replaced with ones under the root
    config: Config,
    /// Where to place a launcher shortcut, e.g. a desktop folder
    shortcut_dir: Option<PathBuf>,
    /// Install into a non-empty directory
    #[builder(default)]
    force: bool,
    /// Binary copied into `bin/`; defaults to the running executable
    executable: Option<PathBuf>,
}

impl Installer {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn run(&self) -> anyhow::Result<InstallReport> {
        info!("NeuroSigNet Pro installation starting");

        let mut steps = Vec::with_capacity(InstallStep::ALL.len());
        let mut root = self.root.clone();

        for step in InstallStep::ALL {
            info!("{}...", step);
            let outcome = match step {
                InstallStep::Requirements => self.check_requirements().await,
                InstallStep::Layout => self.install_layout(&root).await,
                InstallStep::Config => self.write_config(&root).await,
                InstallStep::Launcher => self.create_launcher(&root).await,
                InstallStep::Uninstaller => self.create_uninstaller(&root).await,
                InstallStep::Samples => create_samples(&root).await,
                InstallStep::Report => write_report(&root, &steps).await,
            }
            .with_context(|| format!("{step} failed"))?;
            record(&mut steps, step, outcome);

            // Scripts and config embed absolute paths, so resolve the root once it exists
            if step == InstallStep::Requirements {
                root = fs::canonicalize(&self.root)
                    .await
                    .with_context(|| format!("Failed to resolve {}", self.root.display()))?;
            }
        }

        info!("NeuroSigNet Pro installed successfully");

        Ok(InstallReport {
            launcher: root.join(launcher_name()),
            install_directory: root,
            steps,
        })
    }

    async fn check_requirements(&self) -> anyhow::Result<StepOutcome> {
        match fs::metadata(&self.root).await {
            Ok(meta) if !meta.is_dir() => {
                anyhow::bail!("{} exists and is not a directory", self.root.display());
            }
            Ok(_) => {
                let mut entries = fs::read_dir(&self.root)
                    .await
                    .with_context(|| format!("Failed to read {}", self.root.display()))?;
                if entries.next_entry().await?.is_some() {
                    if !self.force {
                        anyhow::bail!(
                            "{} is not empty; pass --force to install into it anyway",
                            self.root.display()
                        );
                    }
                    fs::create_dir_all(&self.root).await?;
                    check_writable(&self.root).await?;
                    return Ok(StepOutcome::CompletedWithWarnings(
                        "installing into a non-empty directory".to_string(),
                    ));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("Failed to inspect {}", self.root.display())),
        }

        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        check_writable(&self.root).await?;
        Ok(StepOutcome::Completed)
    }

    async fn install_layout(&self, root: &Path) -> anyhow::Result<StepOutcome> {
        for dir in LAYOUT {
            fs::create_dir_all(root.join(dir))
                .await
                .with_context(|| format!("Failed to create {dir}/"))?;
        }

        let source = match &self.executable {
            Some(path) => path.clone(),
            None => match std::env::current_exe() {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Could not locate the running executable");
                    return Ok(StepOutcome::CompletedWithWarnings(format!(
                        "executable not copied: {e}"
                    )));
                }
            },
        };

        let bin_dir = root.join("bin");
        fs::create_dir_all(&bin_dir).await.context("Failed to create bin/")?;
        let target = bin_dir.join(executable_name());
        fs::copy(&source, &target)
            .await
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
        make_executable(&target).await?;

        Ok(StepOutcome::Completed)
    }

    async fn write_config(&self, root: &Path) -> anyhow::Result<StepOutcome> {
        let yaml = render_config(&self.config, root)?;
        fs::write(root.join("config.yaml"), yaml)
            .await
            .context("Failed to write config.yaml")?;
        Ok(StepOutcome::Completed)
    }

    async fn create_launcher(&self, root: &Path) -> anyhow::Result<StepOutcome> {
        let launcher = root.join(launcher_name());
        fs::write(&launcher, launcher_script())
            .await
            .with_context(|| format!("Failed to write {}", launcher.display()))?;
        make_executable(&launcher).await?;

        let Some(shortcut_dir) = &self.shortcut_dir else {
            return Ok(StepOutcome::Completed);
        };

        let shortcut = shortcut_dir.join(shortcut_name());
        let created = async {
            fs::create_dir_all(shortcut_dir).await?;
            fs::write(&shortcut, shortcut_script(&launcher)).await?;
            make_executable(&shortcut).await
        }
        .await;

        match created {
            Ok(()) => Ok(StepOutcome::Completed),
            Err(e) => {
                warn!(shortcut = %shortcut.display(), error = %e, "Could not create shortcut");
                Ok(StepOutcome::CompletedWithWarnings(format!(
                    "shortcut {} not created: {e}",
                    shortcut.display()
                )))
            }
        }
    }

    async fn create_uninstaller(&self, root: &Path) -> anyhow::Result<StepOutcome> {
        let shortcut = self.shortcut_dir.as_ref().map(|dir| dir.join(shortcut_name()));
        let uninstaller = root.join(uninstaller_name());
        fs::write(&uninstaller, uninstaller_script(root, shortcut.as_deref()))
            .await
            .with_context(|| format!("Failed to write {}", uninstaller.display()))?;
        make_executable(&uninstaller).await?;
        Ok(StepOutcome::Completed)
    }
}

fn record(steps: &mut Vec<StepRecord>, step: InstallStep, outcome: StepOutcome) {
    if let StepOutcome::CompletedWithWarnings(reason) = &outcome {
        warn!("{} completed with warnings: {}", step, reason);
    }
    steps.push(StepRecord { step, outcome });
}

async fn check_writable(dir: &Path) -> anyhow::Result<()> {
    let probe = dir.join(".neurosignet-write-test");
    fs::write(&probe, b"")
        .await
        .with_context(|| format!("{} is not writable", dir.display()))?;
    fs::remove_file(&probe).await?;
    Ok(())
}

async fn create_samples(root: &Path) -> anyhow::Result<StepOutcome> {
    let samples = root.join("samples");
    fs::create_dir_all(&samples).await?;
    fs::write(samples.join("quick_start_guide.txt"), QUICK_START_GUIDE)
        .await
        .context("Failed to write quick_start_guide.txt")?;
    Ok(StepOutcome::Completed)
}

async fn write_report(root: &Path, steps: &[StepRecord]) -> anyhow::Result<StepOutcome> {
    let report = ReportFile {
        installation: InstallationInfo {
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
            install_directory: root,
        },
        system_info: SystemInfo::current(),
        steps,
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(root.join("installation_report.json"), json)
        .await
        .context("Failed to write installation_report.json")?;
    Ok(StepOutcome::Completed)
}

/// The installed `config.yaml`: the base configuration with storage moved under `root`.
///
/// Written as JSON, which YAML accepts, so every field survives the round trip.
fn render_config(config: &Config, root: &Path) -> anyhow::Result<String> {
    let installed = Config {
        storage: StorageConfig::rooted_at(root),
        ..config.clone()
    };
    let body = serde_json::to_string_pretty(&installed).context("Failed to serialize configuration")?;
    Ok(format!(
        "# NeuroSigNet Pro configuration\n\
         # Environment variables prefixed with NEUROSIGNET_ override these values.\n\
         {body}\n"
    ))
}

fn executable_name() -> &'static str {
    if cfg!(windows) { "neurosignet.exe" } else { "neurosignet" }
}

fn launcher_name() -> &'static str {
    if cfg!(windows) { "start.bat" } else { "start.sh" }
}

fn uninstaller_name() -> &'static str {
    if cfg!(windows) { "uninstall.bat" } else { "uninstall.sh" }
}

fn shortcut_name() -> &'static str {
    if cfg!(windows) { "NeuroSigNet.bat" } else { "NeuroSigNet.sh" }
}

/// Single-quote for POSIX sh
fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

fn launcher_script() -> String {
    if cfg!(windows) {
        "@echo off\r\ncd /d \"%~dp0\"\r\nbin\\neurosignet.exe -f config.yaml %*\r\n".to_string()
    } else {
        "#!/bin/sh\n\
         # Start NeuroSigNet Pro from its installation directory\n\
         cd \"$(dirname \"$0\")\" || exit 1\n\
         exec ./bin/neurosignet -f config.yaml \"$@\"\n"
            .to_string()
    }
}

fn shortcut_script(launcher: &Path) -> String {
    if cfg!(windows) {
        format!("@echo off\r\ncall \"{}\" %*\r\n", launcher.display())
    } else {
        format!("#!/bin/sh\nexec {} \"$@\"\n", sh_quote(launcher))
    }
}

fn uninstaller_script(root: &Path, shortcut: Option<&Path>) -> String {
    if cfg!(windows) {
        let mut script = String::from("@echo off\r\necho Uninstalling NeuroSigNet Pro...\r\n");
        if let Some(shortcut) = shortcut {
            script.push_str(&format!("del /q \"{}\" 2>nul\r\n", shortcut.display()));
        }
        script.push_str(&format!("cd /d \"%TEMP%\"\r\nrmdir /s /q \"{}\"\r\n", root.display()));
        script.push_str("echo NeuroSigNet Pro has been uninstalled successfully.\r\npause\r\n");
        script
    } else {
        let mut script = format!(
            "#!/bin/sh\n\
             printf 'Remove NeuroSigNet Pro from %s? [y/N] ' {root}\n\
             read -r answer\n\
             case \"$answer\" in\n  y|Y|yes|YES) ;;\n  *) echo \"Aborted.\"; exit 0 ;;\nesac\n",
            root = sh_quote(root)
        );
        if let Some(shortcut) = shortcut {
            script.push_str(&format!("rm -f {}\n", sh_quote(shortcut)));
        }
        script.push_str(&format!("rm -rf {}\n", sh_quote(root)));
        script.push_str("echo \"NeuroSigNet Pro has been uninstalled successfully.\"\n");
        script
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
