use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use diagnose_cli::serve::input::ServeConfig;
use diagnose_cli::serve::server;
use diagnose_cli::smoke::{self, SmokeConfig};
use diagnose_cli::train::input::TrainConfig;
use diagnose_cli::train::trainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "DIAGNOSE_LOG",
            "error,diagnose=info,diagnose_cli=info,diagnose_classifiers=info",
        ))
        .init();

    let matches = Command::new("diagnose")
        .version(clap::crate_version!())
        .about("Train, serve and smoke-test a random-forest diagnosis classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Fit a random forest with randomized search and save the model artifact")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file (JSON). Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training CSV. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "File path that the model artifact will be written to. \
                             Overrides the output file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("n_iter")
                        .long("n-iter")
                        .help("Number of parameter combinations sampled by the search.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("cv")
                        .long("cv")
                        .help("Number of cross-validation folds.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/test split and the search.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("no_tracking")
                        .long("no-tracking")
                        .help("Do not record the run in the experiment directory.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions over HTTP from a trained model artifact")
                .arg(
                    Arg::new("config")
                        .help("Path to server configuration file (JSON)")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the model artifact (*.json)")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Address to bind")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Hostname),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Port to listen on")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("smoke")
                .about("Send example feature vectors to a running prediction service")
                .arg(
                    Arg::new("config")
                        .help("Path to smoke-test configuration file (JSON)")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("url")
                        .short('u')
                        .long("url")
                        .help("Prediction endpoint, e.g. http://127.0.0.1:5000/predict")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Url),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("smoke", sub_m)) => handle_smoke(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    if let Some(path) = config_path {
        log::info!("[Diagnose::Train] Training from config: {:?}", path);
    }

    let config = TrainConfig::from_arguments(config_path, matches)?;
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        log::info!("[Diagnose::Train] Effective config:\n{}", default_json);
    }

    match trainer::run_training(&config) {
        Ok(summary) => {
            println!("Best hyperparameters: {}", summary.best_params);
            println!("Cross-validation accuracy: {:.4}", summary.cv_accuracy);
            println!("Test accuracy: {:.4}", summary.test_accuracy);
            if let Some(run_id) = &summary.run_id {
                println!("Run recorded as {}", run_id);
            }
            println!("Model saved to {}", summary.output_file.display());
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let config = ServeConfig::from_arguments(matches.get_one::<PathBuf>("config"), matches)?;
    log::info!(
        "[Diagnose::Serve] Serving {} on {}:{}",
        config.model_path,
        config.host,
        config.port
    );

    match server::run_server(&config) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Server failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_smoke(matches: &ArgMatches) -> Result<()> {
    let config = SmokeConfig::from_arguments(matches.get_one::<PathBuf>("config"), matches)?;
    eprintln!("[Diagnose::Smoke] Posting examples to {}", config.url);

    let results = smoke::run_smoke(&config)?;
    for result in &results {
        println!("{}", result.summary_line());
    }
    Ok(())
}
