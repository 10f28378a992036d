mod cli;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use cli::{Cli, Commands, ConfigKind, LogFormat, LogLevel, OcrArg};
use ebooktools::settings::{ConfigFile, edit_file};
use ebooktools::{EbookToolsConfig, OcrMode, PageRestriction, split_into_folders};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let file = ConfigFile::load_or_default(cli.config.as_deref())
        .await
        .context("Could not load the configuration file")?;
    init_logging(&cli, &file);

    match &cli.command {
        Commands::Find { input_data } => {
            let config = build_config(&cli, &file)?;
            let isbns = config.find(input_data).await?;
            if !isbns.is_empty() {
                println!("{}", isbns);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Convert {
            input_file,
            output_file,
        } => {
            let config = build_config(&cli, &file)?;
            let output = output_file
                .clone()
                .or_else(|| file.output_file.clone())
                .unwrap_or_else(|| PathBuf::from("output.txt"));
            let code = config
                .convert(input_file, &output)
                .await
                .with_context(|| format!("Could not convert {:?}", input_file))?;
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
        Commands::Split {
            folder_with_books,
            output_folder,
            start_number,
            folder_pattern,
            files_per_folder,
        } => {
            let mut options = file.split_options();
            if let Some(v) = output_folder {
                options.output_folder = v.clone();
            }
            if let Some(v) = start_number {
                options.start_number = *v;
            }
            if let Some(v) = folder_pattern {
                options.folder_pattern = v.clone();
            }
            if let Some(v) = files_per_folder {
                options.files_per_folder = usize::try_from(*v)?;
            }
            if let Some(v) = &cli.output_metadata_extension {
                options.output_metadata_extension = v.clone();
            }
            options.dry_run |= cli.dry_run;
            options.reverse |= cli.reverse;

            let report = split_into_folders(folder_with_books, &options)
                .await
                .with_context(|| format!("Could not split {:?}", folder_with_books))?;
            log::info!(
                "Moved {} files into {} folders",
                report.total_files,
                report.folders_created.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Edit {
            cfg_type,
            app,
            reset,
        } => {
            if *cfg_type == ConfigKind::Log {
                bail!("Logging is configured with --loglvl and --logfmt; only 'main' can be edited");
            }
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => ConfigFile::default_path()?,
            };
            if *reset {
                ConfigFile::reset(&path).await?;
            } else {
                edit_file(&path, app.as_deref())
                    .await
                    .with_context(|| format!("Could not edit {:?}", path))?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Built-in defaults, then the configuration file, then command-line flags.
fn build_config(cli: &Cli, file: &ConfigFile) -> Result<EbookToolsConfig> {
    let mut builder = EbookToolsConfig::builder();
    file.apply(&mut builder);

    if let Some(regex) = &cli.isbn_regex {
        builder.isbn_regex(regex.clone());
    }
    if let Some(ocr) = cli.ocr {
        builder.ocr_enabled(match ocr {
            OcrArg::Always => OcrMode::Always,
            OcrArg::True => OcrMode::Enabled,
            OcrArg::False => OcrMode::Disabled,
        });
    }
    if let Some(pages) = &cli.ocrop {
        if let [first, last] = pages.as_slice() {
            builder.ocr_only_first_last_pages(PageRestriction::new(*first, *last));
        }
    }

    builder.build().context("Invalid configuration")
}

fn init_logging(cli: &Cli, file: &ConfigFile) {
    let level = if cli.quiet {
        LevelFilter::Off
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        match cli.loglvl {
            Some(level) => level_filter(level),
            None => file
                .logging_level
                .as_deref()
                .and_then(|name| LogLevel::from_str(name, true).ok())
                .map(level_filter)
                .unwrap_or(LevelFilter::Info),
        }
    };
    let format = cli
        .logfmt
        .or_else(|| {
            file.logging_formatter
                .as_deref()
                .and_then(|name| LogFormat::from_str(name, true).ok())
        })
        .unwrap_or(LogFormat::OnlyMsg);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    match format {
        LogFormat::OnlyMsg => {
            builder.format(|buf, record| writeln!(buf, "{}", record.args()));
        }
        LogFormat::Simple => {
            builder.format(|buf, record| writeln!(buf, "{:<8} {}", record.level(), record.args()));
        }
        LogFormat::Console => {
            builder.format_timestamp_secs().format_target(true);
        }
    }
    builder.init();
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Warning => LevelFilter::Warn,
        LogLevel::Error => LevelFilter::Error,
    }
}
