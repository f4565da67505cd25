#[tokio::main]
async fn main() {
    if let Err(e) = pypolish::run().await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}
