//! badge-generator: render employee badges and assemble print sheets

use anyhow::{anyhow, Context};
use badge_generator::{
    channel, composite, logging, BatchOutcome, GeneratorError, Level, Notification, Orchestrator,
};
use badge_template::{format_employee_id, load_config, BadgeInput, BadgeRenderer, Config, Side};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate employee badges and print sheets")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one badge face from command line values
    Render {
        /// Preset name (defaults to the first preset)
        #[arg(short, long)]
        preset: Option<String>,

        /// Badge face to render
        #[arg(short, long, value_enum, default_value_t = SideArg::Front)]
        side: SideArg,

        /// Employee name
        #[arg(long)]
        name: String,

        /// Employee number, printed as "No. <ID>"
        #[arg(long)]
        id: String,

        #[arg(long, default_value = "")]
        department: String,

        #[arg(long, default_value = "")]
        position: String,

        /// Photo pasted into the front side's photo slot
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Render front and back badges for every spreadsheet row
    Batch {
        /// Spreadsheet (.xlsx, .xls, .xlsb or .ods)
        spreadsheet: PathBuf,

        /// Preset name (defaults to the first preset)
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Lay out rendered badges on a printable PDF
    Pdf {
        /// Folder holding rendered badges (overrides the configuration)
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Output PDF path (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the configured presets
    Presets,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Front,
    Back,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Front => Side::Front,
            SideArg::Back => Side::Back,
        }
    }
}

fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Render {
            preset,
            side,
            name,
            id,
            department,
            position,
            photo,
        } => {
            let preset_name = preset_or_default(&config, preset)?;
            let preset = config.preset(&preset_name)?;
            let side = Side::from(side);

            let mut input = BadgeInput::new(name, format_employee_id(&id), department, position);
            if let Some(photo) = photo {
                input = input.with_photo(photo);
            }
            let record = preset.side(side).merge(side, input);
            let path = BadgeRenderer::new(&config.output_folder).render(&record)?;
            println!("Badge saved as {}", path.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Batch {
            spreadsheet,
            preset,
        } => {
            let preset_name = preset_or_default(&config, preset)?;
            let (notifier, dispatcher) = channel();
            let job = thread::spawn(move || {
                Orchestrator::new(&config)
                    .with_notifier(notifier)
                    .run_file(&spreadsheet, &preset_name)
            });

            let outcome = dispatcher
                .run_until(job, print_notification)
                .map_err(|_| anyhow!("batch worker panicked"))?;
            // run_file sends every error to the queue before returning it
            Ok(match outcome {
                Ok(BatchOutcome::Succeeded { .. }) => ExitCode::SUCCESS,
                Ok(BatchOutcome::Failed { .. }) | Err(_) => ExitCode::FAILURE,
            })
        }

        Command::Pdf { folder, output } => {
            let mut layout = config.pdf.clone();
            if let Some(folder) = folder {
                layout.badge_folder = folder;
            }
            if let Some(output) = output {
                layout.output = output;
            }

            let (notifier, dispatcher) = channel();
            let job = thread::spawn(move || {
                let result = composite(
                    &layout.badge_folder,
                    &layout.front_prefix,
                    &layout.back_prefix,
                    &layout,
                )
                .map_err(GeneratorError::from);
                match &result {
                    Ok(path) => notifier.info(
                        "Success",
                        format!("PDF successfully generated at:\n{}", path.display()),
                    ),
                    Err(e) => notifier.error("Error", format!("Failed to generate PDF: {e}")),
                }
                result
            });

            let result = dispatcher
                .run_until(job, print_notification)
                .map_err(|_| anyhow!("PDF worker panicked"))?;
            Ok(if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Presets => {
            let default = config.presets.default_name();
            for name in config.presets.names() {
                let marker = if Some(name) == default { " (default)" } else { "" };
                println!("{name}{marker}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn preset_or_default(config: &Config, preset: Option<String>) -> anyhow::Result<String> {
    match preset {
        Some(name) => Ok(name),
        None => config
            .presets
            .default_name()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no presets configured")),
    }
}

fn print_notification(notification: Notification) {
    match notification.level {
        Level::Info => println!("{}: {}", notification.title, notification.message),
        Level::Error => eprintln!("{}: {}", notification.title, notification.message),
    }
}
