use std::process;

#[tokio::main]
async fn main() {
    let code = match contentsync_rs::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(code);
}
