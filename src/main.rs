#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let instruction = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };

    if let Err(e) = deskpilot::run(instruction).await {
        eprintln!("deskpilot failed to start: {e}");
        std::process::exit(1);
    }
}
