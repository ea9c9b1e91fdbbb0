mod aggregate;
mod error;
mod filter;
mod models;
mod normalizer;
mod reader;
mod session;
mod summary;

use aggregate::StateSummary;
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use filter::FilterSelection;
use models::Config;
use session::{DashboardFrame, DashboardSession};
use std::fs;
use std::path::Path;
use summary::{SummaryClient, SummaryState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("expenditure-dashboard")
        .version("1.0")
        .about("Computes KPI summaries over agency expenditure data with cascading filters")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .value_name("STATE")
                .help("Filter by state (case-insensitive)"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("CATEGORY")
                .help("Filter by category"),
        )
        .arg(
            Arg::new("agency")
                .long("agency")
                .value_name("NAME")
                .help("Filter by agency name"),
        )
        .arg(
            Arg::new("code")
                .long("code")
                .value_name("UNIQUE_ID")
                .help("Filter by agency unique code"),
        )
        .arg(
            Arg::new("summarize")
                .long("summarize")
                .action(ArgAction::SetTrue)
                .help("Request a best-effort AI summary of the KPI snapshot"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        println!("⚠️  Review {} to point at your data source; continuing with defaults.", config_file);
        default_config
    };

    let mut selection = FilterSelection::default();
    selection.set_state(matches.get_one::<String>("state").cloned());
    selection.set_category(matches.get_one::<String>("category").cloned());
    selection.set_agency_name(matches.get_one::<String>("agency").cloned());
    selection.set_unique_id(matches.get_one::<String>("code").cloned());

    let output_dir = config
        .output_directory
        .clone()
        .unwrap_or_else(|| "output".to_string());
    fs::create_dir_all(&output_dir)?;

    let mut session = DashboardSession::new(config.clone());
    let frame = match session.run_pass(selection).await {
        Some(frame) => frame,
        // Load failure was already reported; halt without partial data.
        None => return Ok(()),
    };

    print_scope_banner(&frame);
    print_filter_options(&frame);
    print_kpis(&frame, &config);
    print_category_summary(&frame, &config);
    print_state_summary(&frame, &config);
    write_filtered_csv(&frame, &config, &output_dir)?;

    if matches.get_flag("summarize") {
        run_summary(&mut session, &frame, &config).await;
    }

    println!("\n✅ Dashboard pass complete!");
    Ok(())
}

/// The "Data displayed for" line of the dashboard: the states actually
/// present in the filtered subset plus the active selections.
fn print_scope_banner(frame: &DashboardFrame) {
    let mut seen = Vec::new();
    for record in &frame.records {
        let state = record.state.to_uppercase();
        if !seen.contains(&state) {
            seen.push(state);
        }
    }

    let display_states = if seen.is_empty() {
        "None".to_string()
    } else if seen.len() > 3 {
        format!("{} (+{} more)", seen[..3].join(", "), seen.len() - 3)
    } else {
        seen.join(", ")
    };

    println!("\n💰 Agency Expenditure Dashboard");
    println!(
        "📌 Data displayed for: State(s): {} | Category: {} | Agency: {} | Code: {}",
        display_states,
        frame.selection.category_label(),
        frame.selection.agency_label(),
        frame.selection.unique_id_label(),
    );
}

fn print_filter_options(frame: &DashboardFrame) {
    println!("\n🔽 Filter options (constrained by earlier selections):");
    println!("   State: {}", format_options(&frame.options.states));
    println!("   Category: {}", format_options(&frame.options.categories));
    println!("   Agency: {}", format_options(&frame.options.agencies));
    println!("   Code: {}", format_options(&frame.options.unique_ids));
}

fn format_options(options: &[String]) -> String {
    if options.len() > 11 {
        format!("{} (+{} more)", options[..11].join(", "), options.len() - 11)
    } else {
        options.join(", ")
    }
}

fn print_kpis(frame: &DashboardFrame, config: &Config) {
    let kpis = frame.kpis.scaled(config.crore_factor);
    let label = &config.currency_label;

    println!("\n📊 KPI SUMMARY");
    println!("==============");
    println!("   Total Budget Assigned ({}): ₹{:.2}", label, kpis.total_limit);
    println!("   Total Success ({}): ₹{:.2}", label, kpis.total_success);
    println!("   Success Rate: {:.2}%", kpis.success_rate);
    println!("   Total Pending ({}): ₹{:.2}", label, kpis.total_pending);
    println!("   Total Re-Initiated ({}): ₹{:.2}", label, kpis.total_re_initiated);
    println!("   Total Balance ({}): ₹{:.2}", label, kpis.total_balance);
}

fn print_category_summary(frame: &DashboardFrame, config: &Config) {
    println!("\n📊 Expenditure Breakdown by Category Status");
    if frame.category_summary.is_empty() {
        println!("   (no categories in the filtered data)");
        return;
    }
    for row in &frame.category_summary {
        let row = row.scaled(config.crore_factor);
        println!(
            "   {}: success ₹{:.2}, pending ₹{:.2}, re-initiated ₹{:.2}",
            row.category, row.success, row.pending, row.re_initiated
        );
    }
}

fn print_state_summary(frame: &DashboardFrame, config: &Config) {
    println!("\n🗺️  Top {} States by Limit Assigned", config.top_states_limit);
    match &frame.state_summary {
        StateSummary::NotApplicable => {
            println!(
                "   ℹ️  This view is only available when '{}' is selected.",
                filter::ALL_STATES
            );
        }
        StateSummary::Ranked(rows) if rows.is_empty() => {
            println!("   (no states in the filtered data)");
        }
        StateSummary::Ranked(rows) => {
            for (i, row) in rows.iter().enumerate() {
                let row = row.scaled(config.crore_factor);
                println!("   {}. {} - ₹{:.2}", i + 1, row.state, row.total_limit);
            }
        }
    }
}

/// The "Raw Data View" table: filtered records with the amount columns
/// scaled to the display unit and labelled accordingly.
fn write_filtered_csv(frame: &DashboardFrame, config: &Config, output_dir: &str) -> Result<()> {
    use csv::Writer;

    let csv_path = Path::new(output_dir).join("filtered_records.csv");
    let mut writer = Writer::from_path(&csv_path)?;

    let label = &config.currency_label;
    writer.write_record(&[
        "sr_no".to_string(),
        "agency_name".to_string(),
        "unique_id".to_string(),
        "state".to_string(),
        "agency_type".to_string(),
        "category".to_string(),
        format!("child_expenditure_limit_assigned ({})", label),
        format!("success ({})", label),
        format!("pending ({})", label),
        format!("re_initiated ({})", label),
        format!("balance ({})", label),
    ])?;

    for record in &frame.records {
        writer.write_record(&[
            record.sr_no.to_string(),
            record.agency_name.clone(),
            record.unique_id.clone(),
            record.state.clone(),
            record.agency_type.clone(),
            record.category.clone(),
            format!("{:.2}", record.child_expenditure_limit_assigned / config.crore_factor),
            format!("{:.2}", record.success / config.crore_factor),
            format!("{:.2}", record.pending / config.crore_factor),
            format!("{:.2}", record.re_initiated / config.crore_factor),
            format!("{:.2}", record.balance / config.crore_factor),
        ])?;
    }

    writer.flush()?;
    println!("\n📄 Filtered table written to: {}", csv_path.display());
    Ok(())
}

async fn run_summary(session: &mut DashboardSession, frame: &DashboardFrame, config: &Config) {
    let (url, api_key) = match (&config.summary_api_url, &config.summary_api_key) {
        (Some(url), Some(key)) => (url.clone(), key.clone()),
        _ => {
            println!("\nℹ️  AI summary skipped: summary_api_url and summary_api_key are not configured.");
            return;
        }
    };

    println!("\n🤖 Requesting AI summary...");
    let client = SummaryClient::new(url, api_key);
    session.request_summary(&client, frame).await;

    match &session.summary_state {
        SummaryState::Ready(text) => println!("   📝 {}", text),
        SummaryState::Failed(message) => {
            println!("   ⚠️  AI summary unavailable: {}", message);
        }
        SummaryState::Idle | SummaryState::Pending => {}
    }
}
