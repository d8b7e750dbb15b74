use std::process::ExitCode;

use clap::error::ErrorKind;
use tracing::info;

use ec2_status_check::check;
use ec2_status_check::config::Config;
use ec2_status_check::logging;
use ec2_status_check::nagios::Report;

const USAGE: &str = "please pass the region name as arg";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Config::try_from_args() {
        Ok(config) => config,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Parser diagnostics go to stderr, the plugin line to stdout
            eprint!("{}", e.render());
            return emit(Report::unknown(USAGE));
        }
    };

    logging::init(&config.log_format, &config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT"),
        build_date = env!("BUILD_DATE"),
        "EC2 status check starting"
    );
    config.display();

    emit(check::run(&config).await)
}

fn emit(report: Report) -> ExitCode {
    println!("{}", report.line());
    report.exit_code()
}
