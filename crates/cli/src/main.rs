use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use roundfsm_cli::args::{Args, Commands};
use roundfsm_cli::logging;
use roundfsm_config::Config;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match &args.command {
        Commands::Init(cmd) => {
            logging::init(
                args.log_level.unwrap_or_default(),
                args.log_format.unwrap_or_default(),
            );

            cmd.run(&args.home)?;
            println!("Wrote {}", args.config_file().display());
        }

        Commands::Start(cmd) => {
            let path = args.config_file();
            let config = Config::load(&path).wrap_err_with(|| {
                format!(
                    "failed to load {}, run `roundfsm init` first",
                    path.display()
                )
            })?;

            logging::init(
                args.log_level.unwrap_or(config.logging.log_level),
                args.log_format.unwrap_or(config.logging.log_format),
            );

            let summary = cmd.run(&args.home, &config)?;
            info!(%summary, "Network stopped");
            println!("{summary}");
        }
    }

    Ok(())
}
