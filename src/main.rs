use std::process::ExitCode;

use clap::Parser;
use frankenbot::bot::{Bot, PublishOutcome};
use frankenbot::config::{BotConfig, setup_logging};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let cli = frankenbot::cli::CliOptions::parse();

    let _ = setup_logging(cli.debug);

    let config = BotConfig::from_cli(&cli);
    if config.image_mode.is_unrestricted() {
        warn!("Unrestricted image mode is on, animal pictures will be refused");
    }

    let bot = Bot::from_config(&config);
    match bot.run(&mut rand::rng()) {
        Ok(report) => {
            match report.publish {
                PublishOutcome::Posted(receipt) => info!("Done, posted {}", receipt.id),
                PublishOutcome::Skipped => {
                    info!("Done, image left at {}", report.output_path.display())
                }
                PublishOutcome::Failed(reason) => warn!(
                    "Done, but posting failed ({}), image left at {}",
                    reason,
                    report.output_path.display()
                ),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Run aborted: {}", err);
            ExitCode::FAILURE
        }
    }
}
