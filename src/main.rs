// src/main.rs

use evalrunner::config::Environment;
use evalrunner::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("evalrunner error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let env = Environment::from_process_env();
    logging::init_logging(args.log_level, env.log_level.as_deref())?;
    run(args, env).await?;
    Ok(())
}
