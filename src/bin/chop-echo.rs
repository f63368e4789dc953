//! A Lambda function that echoes the request line back.
//!
//! Deploy this behind API Gateway or an ALB to check that events make it
//! through; every request gets `<METHOD> <target>` back as `text/plain`.

use lambda_runtime::{tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_chop::init_tracing();

    // The way that Lambda containers are usually set up, this is `bootstrap`:
    if let Ok(handler) = std::env::var("_HANDLER") {
        tracing::info!("_HANDLER: {handler}");
    }

    lambda_chop::start(lambda_chop::echo).await
}
