#[tokio::main]
async fn main() {
    if let Err(e) = krishi_advisor::run().await {
        eprintln!("krishi-advisor: {e}");
        std::process::exit(1);
    }
}
