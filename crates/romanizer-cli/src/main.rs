//! Thin entrypoint for the `romanizer` binary.

#[tokio::main]
async fn main() {
    std::process::exit(romanizer_cli::run().await);
}
