use clap::Parser;
use mal_organizer::core::collection;
use mal_organizer::core::organizer::{BatchReport, UpdateOutcome};
use mal_organizer::utils::{logger, validation::Validate};
use mal_organizer::{CliConfig, Command, MalClient, MalError, Organizer, Result, Settings, TitleMatcher};
use std::path::Path;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    let log_path = logger::init_cli_logger(config.verbose, config.debug);

    tracing::info!("Start of session");
    tracing::debug!("CLI config: {:?}", config);

    let exit_code = match run(config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            e.exit_code()
        }
    };

    exit_session(exit_code, log_path.as_deref());
}

async fn run(config: CliConfig) -> Result<i32> {
    // 驗證參數
    config.validate()?;
    let Some(command) = config.command else {
        return Err(MalError::ValidationError {
            message: "No command provided".to_string(),
        });
    };

    // convert 不需要設定檔與連線
    if command == Command::Convert {
        return convert(&config);
    }

    let mut settings = Settings::load(config.config.as_deref())?;
    if config.dry_run {
        settings.update.dry_run = true;
    }
    settings.validate()?;

    let client = MalClient::new(&settings);
    let organizer = Organizer::new(client)
        .with_matcher(TitleMatcher::new(
            settings.matching.cutoff,
            settings.matching.max_candidates,
        ))
        .with_search_limit(settings.matching.search_limit)
        .with_dry_run(settings.update.dry_run)
        .with_progress(settings.update.show_progress);

    match command {
        Command::Get => match config.id {
            Some(id) => {
                let anime = organizer.get_anime(id).await?;
                println!("{}", serde_json::to_string_pretty(&anime)?);
            }
            None => {
                let name = config.require_name()?;
                match organizer.get_anime_status(name).await? {
                    Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                    None => println!("'{}' is not on your list", name),
                }
            }
        },
        Command::Fields => {
            let anime = organizer
                .get_anime_fields(config.require_id()?, &["num_episodes", "related_anime"])
                .await?;
            println!("{}", serde_json::to_string_pretty(&anime)?);
        }
        Command::Search => {
            let name = config.require_name()?;
            let anime = organizer
                .search_anime(name)
                .await?
                .ok_or_else(|| MalError::AnimeNotFound {
                    name: name.to_string(),
                })?;
            println!("{}", serde_json::to_string_pretty(&anime)?);
        }
        Command::Update => {
            let outcome = organizer
                .update_anime_status(config.require_name()?, config.require_status()?)
                .await?;
            print_outcome(&outcome)?;
        }
        Command::UpdateCollection => {
            let animes = collection::load_collection(config.require_file()?)?;
            let report = organizer.update_collection(&animes, shutdown_signal()).await;
            return Ok(print_report(&report));
        }
        Command::Convert => return convert(&config),
    }

    Ok(EXIT_SUCCESS)
}

fn convert(config: &CliConfig) -> Result<i32> {
    let source = config.require_file()?;
    let destination = collection::convert_text_to_json(source, config.output.as_deref())?;
    println!("✅ Converted '{}' to '{}'", source.display(), destination.display());
    Ok(EXIT_SUCCESS)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_outcome(outcome: &UpdateOutcome) -> Result<()> {
    match outcome {
        UpdateOutcome::Updated { anime, status } => {
            println!("✅ Updated '{}' ({})", anime.title, anime.id);
            println!("{}", serde_json::to_string_pretty(status)?);
        }
        UpdateOutcome::DryRun { anime, payload } => {
            println!("🔍 Would update '{}' ({}) with:", anime.title, anime.id);
            println!("{}", serde_json::to_string_pretty(payload)?);
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport) -> i32 {
    println!(
        "📊 {} of {} animes updated",
        report.updated.len(),
        report.total
    );

    if !report.not_updated.is_empty() {
        println!("Animes that couldn't be updated: ");
        for failed in &report.not_updated {
            println!("  - {}: {}", failed.name, failed.reason);
        }
    }

    if report.interrupted {
        println!(
            "⚠️ Interrupted, {} animes were not processed",
            report.total - report.processed()
        );
        return EXIT_INTERRUPTED;
    }

    if report.not_updated.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

fn exit_session(exit_code: i32, log_path: Option<&Path>) -> ! {
    tracing::info!("End of session");

    // 只接受 POSIX 範圍內的退出碼
    let exit_code = if (0..=255).contains(&exit_code) {
        exit_code
    } else {
        EXIT_FAILURE
    };

    if exit_code == EXIT_FAILURE {
        match log_path {
            Some(path) => eprintln!(
                "There were errors during the execution. Check the logs at {} for more information.",
                path.display()
            ),
            None => eprintln!("There were errors during the execution. Run again with -v or -d for more information."),
        }
    }

    std::process::exit(exit_code)
}
