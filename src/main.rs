use devlogs::cli::{output, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = Cli::run().await {
        output::print_error(&output::format_error_chain(&e));
        std::process::exit(1);
    }
}
