use anyhow::Result;
use stanza_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  store_backend: {:?}", config.store_backend);
    println!("  store_root: {}", config.store_root.display());
    println!("  bucket: {}", config.bucket);
    println!("  folder: {}", config.folder);
    println!("  chart_url: {}", config.chart_url);
    println!("  first_chart_date: {}", config.first_chart_date);
    println!("  lyrics_api_base: {}", config.lyrics_api_base);
    println!(
        "  lyrics_access_token: {}",
        if config.lyrics_access_token.is_some() { "<set>" } else { "<not set>" }
    );
    println!("  gender_table: {}", config.gender_table);
    println!(
        "  gender_overrides_path: {}",
        config
            .gender_overrides_path
            .as_ref()
            .map_or_else(|| "<not set>".to_string(), |p| p.display().to_string())
    );
    println!("  max_song_words: {}", config.max_song_words);
    println!(
        "  retry: {} attempts, {}-{} ms, {} rounds",
        config.retry_max_attempts,
        config.retry_min_delay_ms,
        config.retry_max_delay_ms,
        config.lyrics_max_rounds
    );
    println!("  log_level: {}", config.log_level);

    println!("\nPriority: CLI args > ENV vars (STANZA_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure stanza.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
