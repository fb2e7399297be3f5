//! Демо шины topica.
//!
//! Регистрирует топики, подписывается шаблонами, публикует сообщения и
//! печатает, сколько получил каждый подписчик.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{task::JoinSet, time::timeout};
use tracing::{debug, info};
use topica::{init_logging, ErrorExt, LogFormat, PubSub, Settings, TextMessage};

#[derive(Parser)]
#[command(name = "topica")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TOPICA_GIT_COMMIT"),
    ", built ",
    env!("TOPICA_BUILD_TIME"),
    ")"
))]
#[command(about = "In-process pub/sub bus demo", long_about = None)]
struct Cli {
    /// Топик продюсера (можно указать несколько раз)
    #[arg(
        short,
        long = "topic",
        default_values = ["a.b.c", "x.y.c", "foo/bar"]
    )]
    topics: Vec<String>,
    /// Шаблон подписки (можно указать несколько раз)
    #[arg(
        short,
        long = "pattern",
        default_values = ["*.*.c", "x.y.*", "foo/*"]
    )]
    patterns: Vec<String>,
    /// Сообщений на каждый топик
    #[arg(short, long, default_value = "100")]
    messages: usize,
    /// Ёмкость очереди топика (по умолчанию из настроек)
    #[arg(short, long)]
    capacity: Option<usize>,
    /// Формат логов: compact, pretty или json
    #[arg(long, env = "TOPICA_LOG_FORMAT")]
    log_format: Option<LogFormat>,
    /// Путь к файлу настроек
    #[arg(long)]
    config: Option<PathBuf>,
    /// Сколько ждать следующего сообщения, прежде чем считать подписчика
    /// опустошённым, мс
    #[arg(long, default_value = "200")]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(cli.config.as_deref()).context("loading settings")?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    let _logging = init_logging(settings.logging.clone()).context("initializing logging")?;

    let bus: PubSub<TextMessage> = PubSub::from_settings(&settings);
    let capacity = cli.capacity.unwrap_or(settings.default_capacity);

    let producers = cli
        .topics
        .iter()
        .map(|topic| bus.register_producer(topic, capacity))
        .collect::<Result<Vec<_>, _>>()
        .context("registering producers")?;

    let settle = Duration::from_millis(cli.settle_ms);
    let mut consumers = JoinSet::new();
    for pattern in &cli.patterns {
        let mut subscriber = bus.subscribe(pattern);
        let pattern = pattern.clone();
        consumers.spawn(async move {
            let mut received = 0usize;
            while let Ok(Some(message)) = timeout(settle, subscriber.recv()).await {
                debug!(pattern = %pattern, topic = %message.topic, "received");
                received += 1;
            }
            (pattern, received)
        });
    }

    for producer in &producers {
        for i in 0..cli.messages {
            let mut message = TextMessage::new(producer.topic(), format!("message {i}"));
            loop {
                match producer.publish(message) {
                    Ok(()) => break,
                    Err(e) if e.status_code().is_retryable() => {
                        message = e.into_message();
                        tokio::task::yield_now().await;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        info!(topic = producer.topic(), count = cli.messages, "published");
    }

    let mut results = Vec::with_capacity(cli.patterns.len());
    while let Some(joined) = consumers.join_next().await {
        results.push(joined.context("consumer task failed")?);
    }
    results.sort();

    for (pattern, received) in &results {
        println!("{pattern:<20} {received}");
    }
    let stats = bus.stats().snapshot();
    println!(
        "published={} rejected={} delivered={} dropped={}",
        stats.published, stats.rejected, stats.delivered, stats.dropped
    );

    bus.shutdown();
    Ok(())
}
