use early_user_mailer::run;
use early_user_mailer::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() {
    // a missing .env is fine, the process environment may already be complete
    dotenv::dotenv().ok();

    if let Err(e) = init_subscriber(get_subscriber("info")) {
        eprintln!("error installing tracing subscriber: {e}");
    }

    if let Err(e) = run().await {
        tracing::error!(error = %e, "early user campaign aborted");
    }
}
