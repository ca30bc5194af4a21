use clap::Parser;
use sitekit::cli::{init_tracing, CommonArgs};
use sitekit::{CopyCli, OutputFormatter, OutputMode, SiteKit, SiteKitError, UserFriendlyError};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = match CopyCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return report_usage_error(e),
    };

    init_tracing(cli.common.verbosity_level());

    if cli.common.generate_config {
        return handle_generate_config(&cli.common);
    }

    let sitekit = match SiteKit::from_copy_cli(&cli) {
        Ok(sitekit) => sitekit,
        Err(e) => {
            print_startup_error(&e, cli.common.output_format.into());
            return e.exit_code();
        }
    };

    // Present unless --generate-config was given, which returned above.
    let Some(document) = cli.document.as_ref() else {
        return 1;
    };

    match sitekit.copy_referenced_files(document, cli.common.dry_run) {
        Ok(report) => {
            if report.has_problems() {
                2 // Finished, but some files were not copied
            } else {
                0
            }
        }
        Err(e) => {
            sitekit.handle_error(&e);
            e.exit_code()
        }
    }
}

fn report_usage_error(error: clap::Error) -> i32 {
    let _ = error.print();
    if error.use_stderr() {
        1
    } else {
        0 // --help and --version
    }
}

fn handle_generate_config(common: &CommonArgs) -> i32 {
    let config_path = common.config_path_or_default();

    match SiteKit::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  site-copy <document> --config {}", config_path.display());
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &SiteKitError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
