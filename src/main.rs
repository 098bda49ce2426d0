#[cfg(feature = "tracy")]
use tracy_client::Client;
use sdftext::launcher::run;

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracy")]
    let _client = Client::start();

    run()
}
