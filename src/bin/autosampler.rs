use anyhow::{bail, Context};
use autosampler_client::{
    clear_download_progress_callback, set_download_progress_callback, ClientConfig, DroppedFile,
    HeadlessEngineFactory, NoticeLevel, Session,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autosampler")]
#[command(about = "Generate AI variations of your own drum samples", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the sample service (overrides config and AUTOSAMPLER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a sample and generate variations
    Generate {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value_t = 0.0)]
        pitch: f32,

        #[arg(short, long, default_value_t = 0.0)]
        variation: f32,

        /// Save every generated sample after generation
        #[arg(short, long)]
        download: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every sample the service has generated
    History,

    /// Download generated samples by identifier
    Download {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url).validated()?;
    }

    match cli.command {
        Commands::Generate {
            input,
            pitch,
            variation,
            download,
            output,
        } => {
            if let Some(dir) = output {
                config = config.with_download_dir(dir);
            }
            handle_generate(&config, input, pitch, variation, download, cli.quiet)
        }
        Commands::History => handle_history(&config),
        Commands::Download { ids, output } => {
            if let Some(dir) = output {
                config = config.with_download_dir(dir);
            }
            handle_download(&config, &ids, cli.quiet)
        }
    }
}

fn handle_generate(
    config: &ClientConfig,
    input: PathBuf,
    pitch: f32,
    variation: f32,
    download: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut session = Session::connect(config, Box::new(HeadlessEngineFactory))?;

    let file = DroppedFile::from_path(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let accepted = session.orchestrator_mut().drop_files(vec![file]);
    report_notices(&mut session);
    accepted?;

    let orch = session.orchestrator_mut();
    orch.set_pitch_shift(pitch);
    orch.set_variation(variation);

    if !quiet {
        let params = session.orchestrator().params();
        eprintln!("Input:     {}", input.display());
        eprintln!("Pitch:     {:.2}", params.pitch_shift);
        eprintln!("Variation: {:.2}", params.variation);
        eprintln!("Service:   {}", config.api_base());
        eprintln!();
    }

    session.generate()?;
    session.run_until_idle()?;
    if report_notices(&mut session) {
        bail!("sample generation failed");
    }

    let view = session.orchestrator().snapshot();
    let ids: Vec<String> = view.gallery.iter().filter_map(|s| s.id.clone()).collect();
    for (i, id) in ids.iter().enumerate() {
        if quiet {
            println!("{id}");
        } else {
            eprintln!("  Generated sample {}: {}", i + 1, session.api().audio_url(id));
        }
    }
    if !quiet {
        eprintln!();
        eprintln!("History now holds {} sample(s)", view.history.len());
    }

    if download {
        if !quiet {
            setup_progress_callback();
        }
        for id in &ids {
            session.download(id);
        }
        session.run_until_idle()?;
        print_downloads(&mut session, ids.len(), quiet)?;
    }

    Ok(())
}

fn handle_history(config: &ClientConfig) -> anyhow::Result<()> {
    let session = Session::connect(config, Box::new(HeadlessEngineFactory))?;
    let urls = session.api().list_all_audio()?;
    for url in urls {
        println!("{url}");
    }
    Ok(())
}

fn handle_download(config: &ClientConfig, ids: &[String], quiet: bool) -> anyhow::Result<()> {
    let mut session = Session::connect(config, Box::new(HeadlessEngineFactory))?;
    if !quiet {
        setup_progress_callback();
    }
    for id in ids {
        session.download(id);
    }
    session.run_until_idle()?;
    print_downloads(&mut session, ids.len(), quiet)
}

fn print_downloads(session: &mut Session, expected: usize, quiet: bool) -> anyhow::Result<()> {
    clear_download_progress_callback();
    let saved = session.orchestrator_mut().drain_downloads();
    for path in &saved {
        if quiet {
            println!("{}", path.display());
        } else {
            eprintln!("Saved {}", path.display());
        }
    }
    if saved.len() < expected {
        bail!("{} of {} download(s) failed", expected - saved.len(), expected);
    }
    Ok(())
}

/// Prints queued notices; returns whether any of them was an error.
fn report_notices(session: &mut Session) -> bool {
    let mut failed = false;
    for notice in session.orchestrator_mut().drain_notices() {
        match notice.level {
            NoticeLevel::Warn => eprintln!("warning: {}", notice.message),
            NoticeLevel::Error => {
                failed = true;
                eprintln!("error: {}", notice.message);
            }
        }
    }
    failed
}

fn setup_progress_callback() {
    set_download_progress_callback(|downloaded, total| {
        if total > 0 {
            let percent = (downloaded as f64 / total as f64 * 100.0).round() as u64;
            eprint!(
                "\rDownloading: {:>3}% ({:.2} MB / {:.2} MB)",
                percent,
                downloaded as f64 / 1_000_000.0,
                total as f64 / 1_000_000.0
            );
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\rDownloading: {:.2} MB", downloaded as f64 / 1_000_000.0);
        }
    });
}
