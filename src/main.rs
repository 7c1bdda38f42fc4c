// Entry point and high-level CLI flow.
//
// - Option [1] loads and validates the order CSV, printing diagnostics.
// - Option [2] generates every report, writes them as CSV plus a JSON
//   summary, and previews each one as a markdown table.
// - After generating reports, the user can go back to the menu or exit.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use once_cell::sync::Lazy;
use order_analytics::config::FileConfig;
use order_analytics::growth::calculate_growth;
use order_analytics::loader;
use order_analytics::output::{preview_table, write_csv, write_json};
use order_analytics::reports;
use order_analytics::types::SummaryStats;
use order_analytics::util::{format_int, format_number};
use order_analytics::{DateWindow, Granularity, OrderSet, ReportConfig};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tabled::Tabled;
use tracing_subscriber::EnvFilter;

// Loaded once, reported on many times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<OrderSet>,
}

const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "order-analytics", about = "Sales, delivery and customer reports from an order CSV")]
struct Args {
    /// Merged order-line CSV.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "ORDER_ANALYTICS_DATA",
        default_value = "product_orders_sellers_review_customer_merged.csv"
    )]
    data: PathBuf,

    /// TOML file with report settings.
    #[arg(short, long, value_name = "FILE", env = "ORDER_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the report files are written to.
    #[arg(short, long, value_name = "DIR", env = "ORDER_ANALYTICS_OUT", default_value = ".")]
    out_dir: PathBuf,

    /// RFM reference date (YYYY-MM-DD).
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// First day of the daily report window.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the daily report window (compared at midnight).
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    granularity: Option<Granularity>,

    /// Rows kept by the city, product and customer rankings.
    #[arg(long)]
    top_n: Option<usize>,

    /// Categories kept per year by the trend reports.
    #[arg(long)]
    top_per_year: Option<usize>,

    /// Fill year/month from the purchase timestamp when the CSV lacks them.
    #[arg(long)]
    derive_periods: bool,

    /// Load and generate once, without the interactive menu.
    #[arg(long)]
    batch: bool,
}

fn build_config(args: &Args) -> Result<ReportConfig> {
    let file = match &args.config {
        Some(path) => FileConfig::read(path)
            .with_context(|| format!("reading config file {}", path.display()))?,
        None => FileConfig::default(),
    };
    let mut config = ReportConfig::from_file(file);
    if let Some(d) = args.reference_date {
        config.reference_date = d;
    }
    if let Some(g) = args.granularity {
        config.daily_granularity = g;
    }
    if let Some(n) = args.top_n {
        config.top_n = n;
    }
    if let Some(n) = args.top_per_year {
        config.top_per_year = n;
    }
    Ok(config)
}

/// The daily window: flags override the configured window, which defaults
/// to the first and last purchase dates in the data.
fn resolve_window(args: &Args, config: &ReportConfig, data: &OrderSet) -> Option<DateWindow> {
    let base = config.window.or_else(|| DateWindow::covering(data))?;
    Some(DateWindow::new(
        args.start.unwrap_or(base.start),
        args.end.unwrap_or(base.end),
    ))
}

/// Read a single line after printing the common "Enter choice:" prompt.
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` on `N` or closed stdin.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Load the CSV into `APP_STATE`; `false` if nothing could be loaded.
fn handle_load(args: &Args) -> bool {
    match loader::load_orders(&args.data) {
        Ok((mut data, load_report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                format_int(load_report.total_rows),
                format_int(load_report.loaded_rows)
            );
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors.",
                    format_int(load_report.parse_errors)
                );
            }
            if args.derive_periods {
                data = data.derive_periods();
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
            state.data = Some(data);
            true
        }
        Err(e) => {
            tracing::error!(path = %args.data.display(), error = %e, "failed to load file");
            false
        }
    }
}

/// Write one report table and preview its head.
fn emit<T>(out_dir: &Path, file: &str, title: &str, note: Option<&str>, rows: &[T])
where
    T: Serialize + Tabled + Clone,
{
    let path = out_dir.join(file);
    if let Err(e) = write_csv(&path, rows) {
        tracing::error!(path = %path.display(), error = %e, "write error");
    }
    preview_table(title, note, rows, PREVIEW_ROWS);
    println!("(Full table exported to {})\n", path.display());
}

fn skip(report: &str, e: order_analytics::Error) {
    println!("{}: skipped ({})\n", report, e);
}

fn handle_generate_reports(args: &Args, config: &ReportConfig) {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let out = args.out_dir.as_path();
    if let Err(e) = std::fs::create_dir_all(out) {
        tracing::error!(dir = %out.display(), error = %e, "cannot create output directory");
        return;
    }
    let n = config.top_n;
    println!("Generating reports...\n");

    let window = resolve_window(args, config, &data);
    let daily = window
        .map(|w| reports::daily_orders(&data, &w, config.daily_granularity))
        .unwrap_or_default();
    let (total_orders, total_sales) = reports::daily_totals(&daily);
    let note = window.map(|w| format!("{} to {}", w.start, w.end));
    emit(out, "daily_orders.csv", "Daily Orders", note.as_deref(), &daily);
    println!(
        "Total orders: {}, Total revenue: ${}\n",
        format_int(total_orders),
        format_number(total_sales, 2)
    );

    match reports::monthly_sales(&data) {
        Ok(monthly) => {
            emit(out, "monthly_sales.csv", "Monthly Sales", None, &monthly);
            let growth = calculate_growth(&monthly);
            emit(out, "monthly_growth.csv", "Monthly Sales Growth", None, &growth);
        }
        Err(e) => skip("Monthly Sales", e),
    }

    let per_year = config.top_per_year;
    let per_year_note = format!("Top {} per year", per_year);
    match reports::category_trends(&data, per_year) {
        Ok(trends) => {
            emit(out, "category_trends.csv", "Category Sales Trends", Some(per_year_note.as_str()), &trends);
            let growth = calculate_growth(&trends);
            emit(out, "category_growth.csv", "Category Sales Growth", None, &growth);
        }
        Err(e) => skip("Category Sales Trends", e),
    }
    match reports::top_sales_per_year(&data, per_year) {
        Ok(top) => emit(out, "top_sales_per_year.csv", "Top Category Sales per Year", Some(per_year_note.as_str()), &top),
        Err(e) => skip("Top Category Sales per Year", e),
    }

    match reports::product_sales_ranking(&data, n) {
        Ok(r) => {
            emit(out, "top_products_by_sales.csv", "Top Products (Total Sales)", None, &r.top);
            emit(out, "bottom_products_by_sales.csv", "Bottom Products (Total Sales)", None, &r.bottom);
        }
        Err(e) => skip("Product Sales Ranking", e),
    }
    match reports::product_orders_ranking(&data, n) {
        Ok(r) => {
            emit(out, "top_products_by_orders.csv", "Top Products (Total Orders)", None, &r.top);
            emit(out, "bottom_products_by_orders.csv", "Bottom Products (Total Orders)", None, &r.bottom);
        }
        Err(e) => skip("Product Orders Ranking", e),
    }

    let rfm = reports::rfm(&data, config.reference_instant());
    let rfm_note = format!("Recency in days before {}", config.reference_date);
    emit(out, "rfm.csv", "Customer RFM", Some(rfm_note.as_str()), &rfm);
    let summary = reports::rfm_summary(&rfm);
    preview_table("RFM Statistics", None, &summary.rows(), 8);
    let top = reports::top_customers(&rfm, n);
    emit(out, "top_customers.csv", "Top Customers by Spend", None, &top);

    match reports::city_delivery_ranking(&data, n) {
        Ok(r) => {
            emit(out, "cities_slowest_delivery.csv", "Cities with the Longest Delivery Delay", None, &r.top);
            emit(out, "cities_fastest_delivery.csv", "Cities with the Fastest Delivery", None, &r.bottom);
        }
        Err(e) => skip("City Delivery Ranking", e),
    }
    match reports::city_lateness_ranking(&data, n) {
        Ok(r) => {
            emit(out, "cities_most_late.csv", "Cities with the Most Late Deliveries", None, &r.most_late);
            emit(out, "cities_most_ontime.csv", "Cities with the Most On-Time Deliveries", None, &r.most_ontime);
        }
        Err(e) => skip("City Lateness Ranking", e),
    }

    let stats = SummaryStats {
        window_start: window.map(|w| w.start.to_string()).unwrap_or_default(),
        window_end: window.map(|w| w.end.to_string()).unwrap_or_default(),
        total_orders,
        total_sales,
        total_customers: rfm.len(),
        rfm: summary,
    };
    let summary_path = out.join("summary.json");
    if let Err(e) = write_json(&summary_path, &stats) {
        tracing::error!(path = %summary_path.display(), error = %e, "write error");
    }
    println!("Summary stats written to {}\n", summary_path.display());
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::debug!(?config, "resolved report config");

    if args.batch {
        if !handle_load(&args) {
            anyhow::bail!("no orders loaded from {}", args.data.display());
        }
        handle_generate_reports(&args, &config);
        return Ok(());
    }

    loop {
        println!("Order Analytics:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                handle_load(&args);
            }
            "2" => {
                println!();
                handle_generate_reports(&args, &config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    Ok(())
}
