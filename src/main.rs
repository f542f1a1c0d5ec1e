//! sp_extract CLI - List every file and folder under a SharePoint / OneDrive URL.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sp_extract::auth::AUTHORITY_HOST;
use sp_extract::client::GRAPH_API_BASE;
use sp_extract::export::ExportStatus;
use sp_extract::{Credentials, Extractor, ExtractorConfig, RunReport};

/// Exit code when the run is interrupted with Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

/// Extract files and folders from SharePoint/OneDrive.
#[derive(Parser)]
#[command(name = "sp_extract")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  sp_extract \"https://contoso.sharepoint.com/sites/myteam\"
  sp_extract \"https://contoso-my.sharepoint.com/personal/user_contoso_com/Documents/Projects\" -o results.csv
  sp_extract \"https://contoso.sharepoint.com/sites/myteam/Documents/Archive\" --debug")]
struct Cli {
    /// SharePoint/OneDrive URL to scan.
    url: String,

    /// Output CSV file path (defaults to sharepoint_contents_<timestamp>.csv).
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Azure AD tenant ID (for service principal).
    #[arg(long, short = 't', env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Azure AD client ID.
    #[arg(long, short = 'c', env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Azure AD client secret (for service principal).
    #[arg(long, short = 's', env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Enable detailed debug logging.
    #[arg(long, short = 'd')]
    debug: bool,

    /// Microsoft Graph endpoint.
    #[arg(long, env = "SP_EXTRACT_GRAPH_ENDPOINT", default_value = GRAPH_API_BASE, hide = true)]
    graph_endpoint: String,

    /// Identity platform host.
    #[arg(long, env = "SP_EXTRACT_AUTHORITY_HOST", default_value = AUTHORITY_HOST, hide = true)]
    authority_host: String,
}

impl Cli {
    fn into_config(self) -> ExtractorConfig {
        ExtractorConfig {
            url: self.url,
            output: self.output,
            credentials: Credentials {
                tenant_id: self.tenant_id,
                client_id: self.client_id,
                client_secret: self.client_secret,
            },
            graph_endpoint: self.graph_endpoint,
            authority_host: self.authority_host,
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "sp_extract=debug" } else { "sp_extract=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let extractor = Extractor::new(cli.into_config());

    tokio::select! {
        result = run(&extractor) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Extraction failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = interrupted(tokio::signal::ctrl_c()) => {
            eprintln!();
            eprintln!("Operation cancelled by user");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

/// Resolves once `signal` fires. If the handler could not be installed this
/// never resolves, so the run is left to finish on its own.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {}
        Err(e) => {
            tracing::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn run(extractor: &Extractor) -> Result<()> {
    let report = extractor
        .run()
        .await
        .context("Could not complete the SharePoint scan")?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Total items found: {}", report.stats.total);
    println!("Files: {}", report.stats.files);
    println!("Folders: {}", report.stats.folders);

    match &report.export {
        Ok(ExportStatus::Written(_)) => {
            println!("Results saved to: {}", report.output.display());
        }
        Ok(ExportStatus::Skipped) => println!("No items found, nothing exported."),
        Err(e) => eprintln!("Warning: results were not saved: {}", e),
    }
}
