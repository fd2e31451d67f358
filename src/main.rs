use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use virtual_tourist::config::Config;
use virtual_tourist::models::{Coordinate, ImageState, MapRegion};
use virtual_tourist::screens::{Alert, MapAction, PrimaryAction, TapOutcome};
use virtual_tourist::App;

#[derive(Parser)]
#[command(name = "virtual-tourist", version, about = "Drop pins and browse nearby Flickr photos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop a pin and download photos around it
    Drop {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// List pins
    Pins,
    /// List a pin's photos
    Photos { pin_id: String },
    /// Replace a pin's photos with a fresh search page
    NewCollection { pin_id: String },
    /// Delete photos of a pin by grid index
    DeleteSelected {
        pin_id: String,
        #[arg(required = true)]
        indexes: Vec<usize>,
    },
    /// Retry a failed photo download
    Retry { pin_id: String, index: usize },
    /// Delete a pin with its photos
    DeletePin { pin_id: String },
    /// Show or save the map region
    Region {
        #[command(subcommand)]
        command: RegionCommand,
    },
}

#[derive(Subcommand)]
enum RegionCommand {
    Show,
    Set {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, default_value = "10.0")]
        span_lat: f64,
        #[arg(long, default_value = "10.0")]
        span_lon: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "virtual_tourist=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("FLICKR_API_KEY must be set")?;
    let mut app = App::new(&config).await?;

    match cli.command {
        Command::Drop { lat, lon } => {
            let coordinate = Coordinate::new(lat, lon);
            let map = app.map_mut();
            map.begin_drop(coordinate);
            let pin = map
                .end_drop()
                .await?
                .context("no pin was dropped")?;
            println!("pin {}", pin.id);

            app.run_until_idle().await?;
            report_alert(app.map_mut().take_alert());
            print_photos(&mut app, &pin.id).await?;
        }
        Command::Pins => {
            for pin in app.map().pins() {
                let photos = app.library().photos(&pin.id).await?;
                println!(
                    "{}  lat={:.5} lon={:.5} pages={} photos={}",
                    pin.id,
                    pin.latitude,
                    pin.longitude,
                    pin.page_count.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                    photos.len()
                );
            }
        }
        Command::Photos { pin_id } => {
            print_photos(&mut app, &pin_id).await?;
        }
        Command::NewCollection { pin_id } => {
            let browser = app.open_photos(&pin_id).await?;
            if let PrimaryAction::NewCollection { discarded, page } =
                browser.press_primary_action().await?
            {
                println!("discarded {} photos, requesting page {}", discarded, page);
            }
            app.run_until_idle().await?;
            report_alert(app.browser_mut()?.take_alert());
            print_photos(&mut app, &pin_id).await?;
        }
        Command::DeleteSelected { pin_id, indexes } => {
            let browser = app.open_photos(&pin_id).await?;
            for index in indexes {
                match browser.tap_cell(index).await? {
                    TapOutcome::SelectionChanged { selected: true } => {}
                    TapOutcome::SelectionChanged { selected: false } => {
                        // Listed twice; select it again.
                        browser.tap_cell(index).await?;
                    }
                    other => println!("photo {} not selectable: {:?}", index, other),
                }
            }
            if let PrimaryAction::DeletedSelected { count, .. } = browser.press_primary_action().await? {
                println!("deleted {} photos", count);
            }
            print_photos(&mut app, &pin_id).await?;
        }
        Command::Retry { pin_id, index } => {
            let browser = app.open_photos(&pin_id).await?;
            let outcome = browser.tap_cell(index).await?;
            println!("{:?}", outcome);
            app.run_until_idle().await?;
            print_photos(&mut app, &pin_id).await?;
        }
        Command::DeletePin { pin_id } => {
            let map = app.map_mut();
            map.toggle_editing();
            if let MapAction::Removed { pin_id, photos } = map.tap_pin(&pin_id).await? {
                println!("deleted pin {} and {} photos", pin_id, photos);
            }
        }
        Command::Region { command } => match command {
            RegionCommand::Show => match app.map_mut().restore_region().await? {
                Some(region) => println!(
                    "center={:.5},{:.5} span={:.5},{:.5}",
                    region.center.latitude,
                    region.center.longitude,
                    region.span_latitude_delta,
                    region.span_longitude_delta
                ),
                None => println!("no saved region"),
            },
            RegionCommand::Set {
                lat,
                lon,
                span_lat,
                span_lon,
            } => {
                let region = MapRegion::new(Coordinate::new(lat, lon), span_lat, span_lon)?;
                app.map_mut().region_changed(region).await?;
                println!("saved");
            }
        },
    }

    Ok(())
}

async fn print_photos(app: &mut App, pin_id: &str) -> anyhow::Result<()> {
    let browser = app.open_photos(pin_id).await?;
    if browser.has_no_images() {
        println!("no images");
        return Ok(());
    }
    for (index, cell) in browser.cells().iter().enumerate() {
        let state = match &cell.state {
            ImageState::Pending => "pending".to_string(),
            ImageState::Failed => "failed (retry available)".to_string(),
            ImageState::Stored(path) => path.clone(),
        };
        println!("{:>3}  {}  {}", index, cell.photo.url, state);
    }
    Ok(())
}

fn report_alert(alert: Option<Alert>) {
    if let Some(alert) = alert {
        eprintln!("{}: {}", alert.title, alert.message);
    }
}
