use anyhow::Result;
use chrono::{Local, Utc};
use clap::Parser;
use sales_report::{
    orders::{
        self,
        export::{write_csv, write_json},
        SalesReport, SalesView,
    },
    Client, Groups, Period, ORDERS_CREDENTIAL,
};

use std::{io, path::PathBuf};

#[derive(Debug, Parser)]
#[command(name = "ls-sales", about = "LemonSqueezy sales & fee report")]
struct Args {
    /// Current month only
    #[arg(long)]
    month: bool,
    /// Today/yesterday/week/all-time breakdown
    #[arg(long)]
    daily: bool,
    /// Last N days
    #[arg(long)]
    days: Option<u32>,
    /// Fee breakdown only
    #[arg(long)]
    fees: bool,
    /// Revenue by product
    #[arg(long)]
    products: bool,
    /// Revenue by product + variant
    #[arg(long)]
    product_variants: bool,
    /// Raw JSON output
    #[arg(long)]
    json: bool,
    /// Raw CSV output
    #[arg(long)]
    csv: bool,
    /// Product group configuration file
    #[arg(long)]
    groups: Option<PathBuf>,
    /// Base URL of the orders API
    #[arg(long, env = "LEMONSQUEEZY_API_URL", default_value = orders::DEFAULT_BASE_URL)]
    base_url: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let groups = match &args.groups {
        Some(path) => Groups::from_file(path)?,
        None => Groups::new(),
    };

    let key = ORDERS_CREDENTIAL.resolve_default()?;
    let client = Client::new(&args.base_url, key)?;
    let all_orders = orders::fetch_all(&client)?;
    let now = Utc::now().with_timezone(&Local).fixed_offset();

    let view = if args.daily {
        SalesView::Daily(args.days.filter(|&days| days > 0))
    } else if args.fees {
        SalesView::Fees
    } else if args.products {
        SalesView::Products
    } else if args.product_variants {
        SalesView::ProductVariants
    } else {
        SalesView::Summary
    };
    let period = Period::from_flags(args.month, args.days);
    let report = SalesReport::new(all_orders, view, period, &groups, now);

    if !args.daily && !report.is_empty() {
        if args.json {
            return write_json(report.orders(), io::stdout().lock());
        }
        if args.csv {
            return write_csv(report.orders(), io::stdout().lock());
        }
    }
    print!("{report}");
    Ok(())
}
