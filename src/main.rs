use clap::Parser;

use tcm_clinic_lib::cli::Cli;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if cli.generate_key {
        println!("{}", tcm_clinic_lib::api::types::generate_token());
        return;
    }

    tcm_clinic_lib::init_tracing();

    if let Err(e) = tcm_clinic_lib::run(cli.into_config()).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
