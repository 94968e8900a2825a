//! Background Removal Client CLI Tool
//!
//! Command-line interface for removing image backgrounds through a remote
//! service using the bgremove-client library.

#[cfg(feature = "cli")]
use bgremove_client::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
