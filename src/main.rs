use color_eyre::Result;
use joystick_relay::config::{HardwareConfig, RelayConfig, RelayMode};
use joystick_relay::joystick::{GpioStatusLed, Mcp3208Joystick, Sampler};
use joystick_relay::net::{associate_until_up, HttpPostTransport, NetworkLink, WifiLink, WiredLink};
use joystick_relay::publish::{
    run_push_loop, HtmlServer, NullIndicator, PushClient, PushSettings, SnapshotPublisher,
    StatusIndicator,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Delay between attempts to bring up the ADC and GPIO.
const HARDWARE_RETRY_DELAY: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let config = RelayConfig::load()?;
    let mode = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<RelayMode>()?,
        None => config.mode,
    };
    info!("Starting joystick relay in {:?} mode", mode);

    let shutdown = CancellationToken::new();
    watch_ctrl_c(shutdown.clone());

    let joystick = open_joystick(&config.hardware).await;

    let mut link: Box<dyn NetworkLink> = match &config.wifi {
        Some(wifi) => Box::new(WifiLink::new(&wifi.ssid, &wifi.password)),
        None => Box::new(WiredLink),
    };
    associate_until_up(link.as_mut()).await;

    match mode {
        RelayMode::Serve => {
            let publisher =
                SnapshotPublisher::new(Sampler::new(Box::new(joystick)), config.language);
            let server = HtmlServer::bind(&config.serve.bind, publisher).await?;
            server.run(shutdown).await;
        }
        RelayMode::Push => {
            info!(
                "Pushing to http://{}{}",
                config.push.server, config.push.path
            );
            let transport =
                HttpPostTransport::new(config.push.server.clone(), config.push.path.clone());
            let client = PushClient::create(
                Sampler::new(Box::new(joystick)),
                Box::new(transport),
                link,
                status_indicator(&config.hardware),
                PushSettings {
                    send_timeout: config.push.send_timeout(),
                    language: config.language,
                },
            );
            run_push_loop(client, shutdown).await;
        }
    }

    info!("Joystick relay stopped");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn watch_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                shutdown.cancel();
            }
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
    });
}

/// Retries hardware bring-up until it works; there is nothing to relay
/// without it.
async fn open_joystick(config: &HardwareConfig) -> Mcp3208Joystick {
    loop {
        match Mcp3208Joystick::open(config) {
            Ok(joystick) => return joystick,
            Err(e) => {
                error!("Failed to initialize joystick hardware: {}", e);
                tokio::time::sleep(HARDWARE_RETRY_DELAY).await;
            }
        }
    }
}

fn status_indicator(config: &HardwareConfig) -> Box<dyn StatusIndicator> {
    match config.status_led_pin.map(GpioStatusLed::open) {
        Some(Ok(led)) => Box::new(led),
        Some(Err(e)) => {
            warn!("Status LED unavailable, continuing without it: {}", e);
            Box::new(NullIndicator)
        }
        None => Box::new(NullIndicator),
    }
}
