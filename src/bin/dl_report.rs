use anyhow::Result;
use chrono::{Local, Utc};
use clap::Parser;
use sales_report::{
    stats::{self, DownloadReport, StatsQuery, StatsView},
    Client, STATS_CREDENTIAL,
};

#[derive(Debug, Parser)]
#[command(name = "dl-report", about = "Download analytics report")]
struct Args {
    /// Today/yesterday/week/window breakdown
    #[arg(long)]
    daily: bool,
    /// Look back N days
    #[arg(long, default_value_t = stats::DEFAULT_DAYS)]
    days: u32,
    /// Filter by app name (e.g. sanebar)
    #[arg(long)]
    app: Option<String>,
    /// Raw JSON output
    #[arg(long)]
    json: bool,
    /// Show user-type events only
    #[arg(long)]
    events: bool,
    /// Base URL of the stats service
    #[arg(long, env = "DIST_STATS_URL", default_value = stats::DEFAULT_BASE_URL)]
    base_url: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let key = STATS_CREDENTIAL.resolve_default()?;
    let client = Client::new(&args.base_url, key)?;
    let query = StatsQuery {
        days: args.days,
        app: args.app.clone(),
    };
    let payload = stats::fetch(&client, &query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&payload.raw)?);
        return Ok(());
    }

    let view = if args.events {
        StatsView::Events
    } else if args.daily {
        StatsView::Daily
    } else {
        StatsView::Summary
    };
    let now = Utc::now().with_timezone(&Local).fixed_offset();
    let report = DownloadReport::new(&payload.stats, view, args.app.as_deref(), args.days, now);
    print!("{report}");
    Ok(())
}
