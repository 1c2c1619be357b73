//! Sample generator - prints a demo dataset to stdout
//!
//! Run with:
//! ```
//! cargo run -p datagen --bin generate
//! ```
//!
//! Set `DATAGEN_CONFIG` to a JSON file to change the row count, writer or seed.

use datagen::fields::DateTimeFormat;
use datagen::sink::StdoutSink;
use datagen::{Definition, Field, GenerationConfig};
use fake::faker::name::en::Name;
use time::Duration;
use time::macros::datetime;
use tracing_subscriber::EnvFilter;

const SAMPLE_ROWS: u64 = 20;

const WORDS: [&str; 10] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("DATAGEN_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading generation config from {path}");
            GenerationConfig::from_json_file(&path)?
        }
        Err(_) => GenerationConfig {
            row_count: SAMPLE_ROWS,
            ..GenerationConfig::default()
        },
    };

    let summary = Definition::builder()
        .add_field(Field::sequential_value("sequence", ["One", "Two", "Three"])?)?
        .add_field(Field::random_value("colour", ["Red", "Green", "Blue"])?)?
        .add_field(Field::random_numbered_value("user", "user-{}", 10_000)?)?
        .add_field(Field::fake("name", Name()))?
        .add_field(Field::random_ipv4("address").with_null_probability(0.2)?)?
        .add_field(Field::random_date_time(
            "last_login",
            datetime!(2020-01-01 0:00),
            datetime!(2025-01-01 0:00),
            DateTimeFormat::default(),
        )?)?
        .add_field(Field::sequential_date_time(
            "created",
            datetime!(2024-01-01 9:00),
            Duration::minutes(15),
            DateTimeFormat::new("[day]/[month]/[year] [hour]:[minute]")?,
        ))?
        .add_field(Field::uuid("id"))?
        .add_field(Field::random_words("tags", 1, 3, WORDS)?)?
        .config(config)
        .sink(StdoutSink)
        .generate()?;

    tracing::info!("Generation completed!");
    tracing::info!("  Rows: {}", summary.rows);
    tracing::info!("  Lines: {}", summary.lines);
    tracing::info!("  Elapsed: {} ms", summary.elapsed_ms);

    Ok(())
}
