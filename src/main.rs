use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = leostream_bridge::cli::Cli::parse();
    if let Err(err) = leostream_bridge::cli::run(cli).await {
        eprintln!("leostream-bridge: {}", err);
        std::process::exit(1);
    }
}
