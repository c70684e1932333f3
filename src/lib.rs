pub mod cli;
pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod index;
pub mod publish;
pub mod report;
pub mod source;
pub mod sync;

/// Parse arguments, run one sync and return the process exit code.
pub async fn run() -> anyhow::Result<i32> {
    use clap::Parser;
    use clap::error::ErrorKind;

    // A .env file is optional
    let _ = dotenvy::dotenv();

    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return Ok(1);
        }
    };

    // Configure logger based on verbose flag
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        log::debug!("Debug logging enabled");
    } else {
        env_logger::init();
    }

    let config = config::resolve_config(args)?;

    let reporter = report::Reporter::new(config.verbose);
    reporter.banner(chrono::Local::now());
    reporter.config_table(&config);

    let source = source::ContentfulClient::new(&config.source, &config.environment)?;
    let dest = elasticsearch::ElasticsearchIndex::from_settings(&config.destination)?;

    log::info!(
        "Syncing '{}' entries from environment {} into index {} at {}",
        config.content_type,
        config.environment,
        config.index_name,
        config.destination.url
    );

    let status = sync::run_sync(&config, &source, &dest, &reporter).await;
    log::debug!("Sync finished: {:?}", status);
    Ok(status.exit_code())
}
