use anyhow::Context;
use dotenv::dotenv;
use std::env;

pub struct Config {
    pub database_url: String,
    pub server_address: String,
}

pub fn load_config() -> anyhow::Result<Config> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let server_address = env::var("SERVER_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    Ok(Config {
        database_url,
        server_address,
    })
}
