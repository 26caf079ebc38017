use log::{error, info};

use dv_casestudy::cli::core::{subcommand_usage, try_get_cli, Commands};
use dv_casestudy::cli::trio::check_trio_settings;
use dv_casestudy::cli::wes::check_wes_settings;
use dv_casestudy::data_types::run_config::{CaseStudy, RunConfig};
use dv_casestudy::errors::{ArgumentError, FAILURE};
use dv_casestudy::exec::SystemRunner;
use dv_casestudy::workflow::run_case_study;

fn run(config: RunConfig) {
    let mut runner = SystemRunner;
    if let Err(e) = run_case_study(&config, &mut runner) {
        error!("Error while running the {} case study: {e}", config.case_study());
        std::process::exit(e.exit_code());
    }
}

fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = match try_get_cli() {
        Ok(cli) => cli,
        Err(e) => {
            // clap's own rendering includes the usage line
            let _ = e.print();
            if !e.use_stderr() {
                // --help and --version
                std::process::exit(exitcode::OK);
            }
            error!("Error while parsing arguments: {}", ArgumentError::from(&e));
            std::process::exit(FAILURE);
        }
    };

    let (case_study, checked) = match cli.command {
        Commands::Wes(settings) => (CaseStudy::Wes, check_wes_settings(*settings)),
        Commands::Trio(settings) => (CaseStudy::Trio, check_trio_settings(*settings))
    };
    let config = match checked {
        Ok(c) => c,
        Err(e) => {
            error!("Error while verifying settings: {e}");
            eprintln!("{}", subcommand_usage(case_study));
            std::process::exit(e.exit_code());
        }
    };

    run(config);
    info!("Process finished successfully.");
}
