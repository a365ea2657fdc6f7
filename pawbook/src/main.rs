use chrono::Days;
use clap::Parser;
use pawbook::config::Command;
use pawbook::store::WriteMode;
use pawbook::{Args, CapacityService, Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry()?;
    tracing::debug!("{:?}", args);

    let Some(command) = args.command else {
        anyhow::bail!("no command given; see --help");
    };

    let store = config.build_store().await?;
    let service = CapacityService::new(store, config.venue_directory());

    match command {
        Command::Generate {
            venue,
            start_date,
            end_date,
            overwrite,
        } => {
            let end_date = match end_date {
                Some(date) => date,
                None => start_date
                    .checked_add_days(Days::new(u64::from(config.generation.initial_window_days)))
                    .ok_or_else(|| anyhow::anyhow!("date out of range"))?,
            };
            let mode = if overwrite { WriteMode::Overwrite } else { WriteMode::FillGaps };
            let summary = service.generate_slots(venue, start_date, end_date, mode).await?;
            println!(
                "Generated {} slots ({} already present) for venue {} from {} to {}",
                summary.slots_written, summary.slots_skipped, venue, start_date, end_date
            );
            for (date, err) in &summary.failed_dates {
                eprintln!("  {date}: generation failed: {err}");
            }
        }
        Command::Availability { date } => {
            let availability = service.query_availability(date).await?;
            println!("{}", serde_json::to_string_pretty(&availability)?);
        }
        Command::VenueSlots {
            venue,
            start_date,
            end_date,
        } => {
            let end_date = end_date.unwrap_or(start_date);
            let slots = service.query_venue_slots(venue, start_date, end_date).await?;
            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
    }

    Ok(())
}
