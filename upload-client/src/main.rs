use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mime::Mime;
use tracing_subscriber::{fmt, EnvFilter};
use upload_client::{AlertKind, HttpTransport, SelectedFile, Uploader};

#[derive(Parser, Debug)]
#[command(name = "upload-client")]
#[command(about = "Uploads a file straight to blob storage through a signed URL")]
struct Args {
    /// File to upload
    path: PathBuf,

    /// Base URL of the grant issuer
    #[arg(long, env = "ISSUER_URL", default_value = "http://localhost:3000")]
    issuer_url: String,

    /// Object name to request instead of the file's own name
    #[arg(long)]
    name: Option<String>,

    /// Content type sent with the upload
    #[arg(long, default_value = "application/octet-stream")]
    content_type: Mime,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the result message
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut file = SelectedFile::from_path(&args.path, args.content_type).await?;
    if let Some(name) = args.name {
        file = file.with_name(name);
    }

    let transport = HttpTransport::new(&args.issuer_url)?;
    let mut uploader = Uploader::new(transport);
    uploader.select_file(file);

    let alert = uploader.upload().await;
    println!("{}", alert.message);

    Ok(match alert.kind {
        AlertKind::Success => ExitCode::SUCCESS,
        AlertKind::Error => ExitCode::FAILURE,
    })
}
