use clap::Parser;
use color_eyre::Result;
use sepviz::loader::{DataSource, LoadOptions};
use sepviz::logging::init_file_logging;
use sepviz::{AppConfig, Args, ConfigManager, RunOptions, APP_NAME};

/// Handle flags that do their work and exit without starting the UI.
fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn load_options(args: &Args, config: &AppConfig) -> Result<LoadOptions> {
    let mut options = LoadOptions::new();
    if let Some(format) = args.format.or(config.file_loading.format()?) {
        options = options.with_format(format);
    }
    Ok(options)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    if let Some(path) = &args.log_file {
        init_file_logging(path, args.debug)?;
    }

    let config = AppConfig::load(APP_NAME)?;
    let options = load_options(&args, &config)?;
    let source = DataSource::resolve(args.path.as_deref(), &config.file_loading.default_path());

    let result = sepviz::run(source, options, RunOptions::from(&args), config);
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
