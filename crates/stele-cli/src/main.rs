use clap::Parser;
use color_eyre::Result;
use serde_json::json;

mod cli;
mod dispatch;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::SteleCli::parse();
    init_tracing(cli.verbose);

    let outcome = dispatch::run(&cli);
    let code = outcome.exit_code();

    if cli.json {
        let payload = json!({
            "status": outcome.status,
            "code": code,
            "message": outcome.message,
            "details": outcome.details,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        if code == 0 {
            println!("{}", outcome.message);
        } else {
            eprintln!("{}", outcome.message);
        }
    }

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = format!("stele_cli={level},stele_core={level},stele_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
