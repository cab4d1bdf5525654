use querychat::db::{ConnectionTarget, LiveDatabase, SqlDatabase};
use querychat::models::{ConnectRequest, PortValue};
use std::env;

/// Prints the schema text the language model would see for a database.
/// Reads DB_TYPE, DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_NAME.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let request = ConnectRequest {
        db_type: env::var("DB_TYPE").ok(),
        username: env::var("DB_USER").ok(),
        password: env::var("DB_PASSWORD").ok(),
        host: env::var("DB_HOST").ok(),
        port: env::var("DB_PORT").ok().map(PortValue::Text),
        db_name: env::var("DB_NAME").ok(),
    };

    let target = ConnectionTarget::from_request(&request)?;
    println!("Connecting to {}...", target.redacted_uri());

    let mut db = LiveDatabase::open(&target).await?;
    println!("✅ Connected ({} dialect)\n", db.dialect());

    match db.table_info().await {
        Ok(info) if info.trim().is_empty() => println!("No tables found."),
        Ok(info) => println!("{}", info),
        Err(e) => println!("❌ Schema introspection failed: {}", e),
    }

    db.close().await?;
    Ok(())
}
