mod error;
mod fixture;

use clap::Parser;

use transport::CodecRegistry;
use transport_testkit::ModelFactory;

use crate::error::InspectError;
use crate::fixture::Fixture;

#[derive(Parser)]
#[command(name = "wire-inspect", about = "Render logical packages as the wire messages a broker would receive")]
struct Cli {
    /// Path to TOML fixture with [[packages]] entries.
    #[arg(long, env = "WIRE_INSPECT_FIXTURE")]
    fixture: String,

    /// Pretty-print each message.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "wire-inspect failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), InspectError> {
    tracing::info!(fixture = %cli.fixture, "loading fixture");
    let fixture = Fixture::load(&cli.fixture)?;
    let factory = ModelFactory::new(CodecRegistry::shared());

    for (i, entry) in fixture.packages.iter().enumerate() {
        let package = entry.to_package().map_err(|e| e.at(i))?;
        let message = factory
            .create_wire_message_from(&package)
            .map_err(|e| InspectError::from(e).at(i))?;
        let line = if cli.pretty {
            serde_json::to_string_pretty(&message)?
        } else {
            serde_json::to_string(&message)?
        };
        println!("{line}");
    }

    tracing::info!(packages = fixture.packages.len(), "done");
    Ok(())
}
