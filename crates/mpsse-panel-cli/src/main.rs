//! MPSSE Panel Tool
//!
//! Offline front end for the panel library: lists models, computes clock
//! divisors, and runs full sessions against the capture driver.

mod config;
mod demo;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use mpsse_panel_hw::{clock_divisor, CaptureDriver, LcdDevice, PanelKind, MASTER_CLOCK_HZ};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mpsse-panel")]
#[command(about = "SPI LCD panels over an MPSSE bridge")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Panel model, overrides the configuration file
    #[arg(long)]
    panel: Option<String>,

    /// Flush strategy (batched, per-call), overrides the configuration file
    #[arg(long)]
    flush: Option<String>,

    /// SPI mode, overrides the configuration file
    #[arg(long)]
    mode: Option<String>,

    /// SCLK frequency in Hz, overrides the configuration file
    #[arg(long)]
    clock_hz: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in panel models
    Panels,
    /// Show the clock divisor for a target SCLK frequency
    Divisor {
        /// Target frequency in Hz
        clock_hz: u32,

        /// Reference clock in Hz
        #[arg(long, default_value_t = MASTER_CLOCK_HZ)]
        master_hz: u32,
    },
    /// Print a panel's init table
    InitSequence,
    /// Run open, init, demo scene and flush against the capture driver,
    /// then dump every packet
    Capture {
        /// Output file for the hex dump (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only flush pages drawn since init instead of the whole buffer
        #[arg(long)]
        partial: bool,
    },
    /// Draw the demo scene and save it as an image
    Render {
        /// Output file path
        #[arg(default_value = "panel.png")]
        output: PathBuf,
    },
    /// Write the effective configuration as TOML
    DumpConfig {
        /// Output file path
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let directive = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Panels => {
            for kind in PanelKind::ALL {
                let model = kind.model();
                println!(
                    "{:<8} {:>3}x{:<3} {:<6} {}",
                    kind,
                    model.geometry.width,
                    model.geometry.height,
                    model.format,
                    kind.description()
                );
            }
        }
        Commands::Divisor {
            clock_hz,
            master_hz,
        } => {
            let divisor = clock_divisor(master_hz, clock_hz)
                .with_context(|| format!("Cannot reach {} Hz from {} Hz", clock_hz, master_hz))?;
            let actual = f64::from(master_hz) / (2.0 * (f64::from(divisor) + 1.0));
            println!("Divisor: 0x{:04X} ({})", divisor, divisor);
            println!("Actual:  {:.0} Hz", actual);
        }
        Commands::InitSequence => {
            let model = config.panel_kind()?.model();
            println!("# {} ({} steps)", model.name, model.init.len());
            for step in &model.init {
                println!("{}", step);
            }
        }
        Commands::Capture { output, partial } => {
            let dump = capture_session(&config, !partial)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, dump)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Capture written to {}", path.display());
                }
                None => print!("{}", dump),
            }
        }
        Commands::Render { output } => {
            let model = config.panel_kind()?.model();
            let mut fb = mpsse_panel_hw::Framebuffer::for_model(&model);
            demo::draw(&mut fb, &model.name);
            let image = image::RgbaImage::from_raw(
                u32::from(fb.width()),
                u32::from(fb.height()),
                fb.to_rgba8(),
            )
            .context("Framebuffer does not match image dimensions")?;
            image
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
            println!("Rendered {} to {}", model.name, output.display());
        }
        Commands::DumpConfig { output } => {
            config.save(&output)?;
            println!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Reads the configuration file if given, then applies command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };
    if let Some(panel) = &cli.panel {
        config.panel = panel.clone();
    }
    if let Some(flush) = &cli.flush {
        config.flush = flush.clone();
    }
    if let Some(mode) = &cli.mode {
        config.spi.mode = mode.clone();
    }
    if let Some(clock_hz) = cli.clock_hz {
        config.spi.clock_hz = clock_hz;
    }
    Ok(config)
}

/// Runs a whole session against the capture driver and returns a hex dump.
fn capture_session(config: &Config, full: bool) -> Result<String> {
    let model = config.panel_kind()?.model();
    let mut driver = CaptureDriver::new();
    let mut lcd = LcdDevice::open(&mut driver, config.device, config.transport()?, model)
        .context("Failed to open capture device")?;
    lcd.set_flush_strategy(config.flush_strategy()?);

    lcd.init().context("Panel init failed")?;
    if let Some(contrast) = config.contrast {
        lcd.set_contrast(contrast).context("Failed to set contrast")?;
    }
    let name = lcd.model().name.clone();
    demo::draw(lcd.framebuffer_mut(), &name);
    let report = lcd.flush(full).context("Flush failed")?;
    lcd.close().context("Failed to close capture device")?;
    info!(
        "Flushed {} pages in {} packets ({} bytes)",
        report.pages, report.packets, report.bytes
    );

    let log = driver.snapshot();
    let mut dump = String::new();
    writeln!(
        dump,
        "# {} packets, {} bytes",
        log.writes.len(),
        log.bytes_written()
    )?;
    for (i, packet) in log.writes.iter().enumerate() {
        write!(dump, "{:04} {:5}:", i, packet.len())?;
        for byte in packet {
            write!(dump, " {:02X}", byte)?;
        }
        dump.push('\n');
    }
    Ok(dump)
}
