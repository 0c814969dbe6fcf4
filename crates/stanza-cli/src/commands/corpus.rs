use anyhow::{Context, Result};
use stanza_etl::corpus::build_corpus;
use stanza_etl::Config;

pub fn run_corpus(config: &Config, max_song_words: Option<usize>) -> Result<()> {
    let artifacts = config.open_artifacts()?;
    let mut options = config.corpus_options();
    if let Some(max) = max_song_words {
        options = options.with_max_song_words(max);
    }

    println!("\n📝 Building corpus\n");

    let summary = build_corpus(&artifacts, &options).context("Corpus build failed")?;

    println!("  Songs with lyrics: {}", summary.songs);
    println!(
        "  Under {} words: {}",
        options.max_song_words, summary.reduced
    );
    println!("  Sections: {}", summary.sections);
    println!("  Lines: {}", summary.lines);
    println!("  Tokens: {}", summary.tokens);
    Ok(())
}
