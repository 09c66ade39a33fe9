use crate::{
    cli::{CommandLineArgs, Mode},
    config::{create_default_config, init_config},
    controller::create_controller,
    shell::Shell,
};

pub mod axis;
pub mod check;
pub mod cli;
pub mod command_executor;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod ledger;
pub mod logging;
pub mod probe;
pub mod shell;
#[cfg(test)]
pub mod testing;

fn should_create_config() -> bool {
    std::env::var("CREATE_CONFIG")
        .map(|val| val == "1" || val.to_lowercase() == "true")
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CommandLineArgs::parse();

    if should_create_config() {
        create_default_config(args.config())?;
    }

    let (config_manager, mut config) = init_config(args.config()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Run with CREATE_CONFIG=1 to create a default configuration file.");
        e
    })?;

    args.apply_to(&mut config);
    config.validate()?;

    let _log_guard = logging::init(&config.logging);
    tracing::info!(path = %config_manager.path().display(), "Configuration loaded");

    match args.mode() {
        Mode::Check { gcode } => {
            let controller = create_controller(&config, config.initial_positions.clone())?;
            let passed = check::run(&controller, gcode, &mut std::io::stdout()).await?;
            controller.shutdown().await?;

            if !passed {
                anyhow::bail!("Moonraker connection check failed");
            }
        }
        Mode::Shell => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut shell = Shell::new(input, std::io::stdout());

            let initial_positions = if args.prompt_positions() {
                shell
                    .prompt_initial_positions(&config.initial_positions)
                    .await?
            } else {
                config.initial_positions.clone()
            };

            let controller = create_controller(&config, initial_positions)?;
            shell.run(&controller).await?;
            controller.shutdown().await?;
        }
    }

    Ok(())
}
