use goose::prelude::*;

use coder_loadtest::config::LoadTestConfig;
use coder_loadtest::error::LoadTestError;

#[tokio::main]
async fn main() -> Result<(), LoadTestError> {
    // Parse Goose options first so --help works without credentials.
    let goose_attack = GooseAttack::initialize()?;

    // Refuse to start without credentials, every user would fail to log in.
    let config = LoadTestConfig::from_env()?;

    coder_loadtest::build_attack(goose_attack, &config)?
        .execute()
        .await?;

    Ok(())
}
