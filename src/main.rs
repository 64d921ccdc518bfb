//! YouTube Comments CLI - Fetch video comments, optionally scored for sentiment.

use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{info, Level};
use yt_comments::{
    cli::Args,
    config::{ApiEndpoints, RunConfig},
    credentials::{Credentials, ServiceAccountAuth, TokenProvider},
    fetcher::{fetch_comments, YouTubeClient},
    formatter::format_comments,
    sentiment::{LanguageClient, SentimentAnalyzer},
};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only comment data.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = RunConfig::from_args(&args)?;

    // Credentials are validated before any request is made
    let credentials = Credentials::from_file(&config.credentials_path)?;
    info!(
        client_email = credentials.client_email(),
        project_id = credentials.project_id().unwrap_or("-"),
        video_id = %config.video_id,
        "Loaded credentials"
    );

    let http = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!("yt-comments/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let endpoints = ApiEndpoints::from_args(&args);
    let tokens: Rc<dyn TokenProvider> = Rc::new(ServiceAccountAuth::new(
        credentials,
        config.scopes(),
        http.clone(),
    ));

    let youtube = YouTubeClient::new(
        http.clone(),
        Rc::clone(&tokens),
        endpoints.comment_threads_url(),
    );
    let language = config.include_sentiment.then(|| {
        LanguageClient::new(http, Rc::clone(&tokens), endpoints.analyze_sentiment_url())
    });

    let comments = fetch_comments(
        &youtube,
        language.as_ref().map(|l| l as &dyn SentimentAnalyzer),
        &config,
    )?;

    let output = format_comments(&comments, args.format);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!("{} comment(s) written to {output_path}", comments.len());
    } else {
        io::stdout().write_all(output.as_bytes())?;
    }

    Ok(())
}
