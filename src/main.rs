use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkview::models::{AppConfig, BackendKind, WaveformMode};
use inkview::panel::{PanelBackend, SimulatorBackend};
use inkview::viewer::Viewer;

#[derive(Parser)]
#[command(name = "inkview")]
#[command(about = "Show an image on an e-paper panel or a simulated display")]
struct Cli {
    /// Image to show (PNG, JPEG, BMP or GIF)
    image: PathBuf,

    /// YAML configuration file (defaults to $CONFIG_FILE)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Panel backend
    #[arg(short, long, value_enum)]
    backend: Option<BackendKind>,

    /// Write the simulated display to this PNG after each update
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Waveform used for the image update
    #[arg(short, long, value_enum)]
    waveform: Option<WaveformMode>,

    /// Partial instead of full update
    #[arg(long)]
    partial: bool,

    /// Return without waiting for the update to finish
    #[arg(long)]
    no_wait: bool,
}

impl Cli {
    /// Command line flags take precedence over the configuration file.
    fn apply(&self, config: &mut AppConfig) {
        let display = &mut config.display;
        if let Some(backend) = self.backend {
            display.backend = backend;
        }
        if let Some(snapshot) = &self.snapshot {
            display.snapshot = Some(snapshot.clone());
        }
        if let Some(waveform) = self.waveform {
            display.waveform = waveform;
        }
        if self.partial {
            display.partial = true;
        }
        if self.no_wait {
            display.wait = false;
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkview=info,eink_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let backend = open_backend(&config)?;
    tracing::info!(panel = %backend.describe(), "Using panel");

    let mut viewer = Viewer::new(backend, &config)?;
    let region = viewer.show_file(&cli.image)?;
    tracing::info!(
        image = %cli.image.display(),
        x = region.x,
        y = region.y,
        width = region.w,
        height = region.h,
        "Image shown"
    );
    viewer.close();
    Ok(())
}

fn open_backend(config: &AppConfig) -> anyhow::Result<Box<dyn PanelBackend>> {
    let display = &config.display;
    match display.backend {
        BackendKind::Simulator => {
            let mut sim = SimulatorBackend::new(display.width, display.height)?;
            if let Some(path) = &display.snapshot {
                sim = sim.with_snapshot(path);
            }
            Ok(Box::new(sim))
        }
        #[cfg(target_os = "linux")]
        BackendKind::Fbdev => Ok(Box::new(inkview::panel::fbdev::FbdevBackend::open(
            config.filter.color_mode,
        )?)),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Fbdev => anyhow::bail!("the fbdev backend is only available on Linux"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "inkview",
            "photo.png",
            "--backend",
            "sim",
            "--waveform",
            "du",
            "--partial",
            "--no-wait",
            "--snapshot",
            "out.png",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        config.display.backend = BackendKind::Fbdev;
        cli.apply(&mut config);

        assert_eq!(config.display.backend, BackendKind::Simulator);
        assert_eq!(config.display.waveform, WaveformMode::Du);
        assert!(config.display.partial);
        assert!(!config.display.wait);
        assert_eq!(config.display.snapshot, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["inkview", "photo.png"]).unwrap();
        let mut config = AppConfig::default();
        config.display.waveform = WaveformMode::Gc4;
        config.display.partial = true;
        cli.apply(&mut config);

        assert_eq!(config.display.waveform, WaveformMode::Gc4);
        assert!(config.display.partial);
        assert!(config.display.wait);
    }

    #[test]
    fn test_missing_image_is_usage_error() {
        let result = Cli::try_parse_from(["inkview"]);
        assert!(result.is_err_and(|e| e.use_stderr()));
    }
}
