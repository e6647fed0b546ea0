//! API key issuing tool
//!
//! Run with: cargo run --bin issue_api_key -- --name storefront-web [--apply-schema]
//!
//! Prints the plaintext key once; only its sha256 hash is stored.

use rand::RngCore;

use game_store::api::middleware::hash_api_key;
use game_store::{db, Config};

const KEY_PREFIX: &str = "gs_";

fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, hex::encode(bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let name = args
        .iter()
        .position(|a| a == "--name")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "storefront".to_string());
    let apply_schema = args.iter().any(|a| a == "--apply-schema");

    let config = Config::from_env()?;
    let pool = db::connect(&config).await?;

    if apply_schema {
        println!("Applying schema...");
        db::apply_schema(&pool).await?;
    }

    if !db::check_schema(&pool).await? {
        anyhow::bail!("Database schema incomplete, rerun with --apply-schema");
    }

    let key = generate_key();
    let key_prefix: String = key.chars().take(KEY_PREFIX.len() + 8).collect();

    let id: uuid::Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO api_keys (name, key_prefix, key_hash)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(&key_prefix)
    .bind(hash_api_key(&key))
    .fetch_one(&pool)
    .await?;

    println!("Issued API key '{}' ({})", name, id);
    println!("{}", key);
    println!("Store it now; it cannot be shown again.");

    pool.close().await;
    Ok(())
}
