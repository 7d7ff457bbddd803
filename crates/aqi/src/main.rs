// crates/aqi/src/main.rs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use aqi_core::calendar::{calendar_grid, daily_heatmap};
use aqi_core::config::ENV_CONFIG;
use aqi_core::coordinates::load_coordinates;
use aqi_core::insights::{
    category_distribution, city_hotspots, city_trends, metro_annual_averages, monthly_profile,
    period_insights, pollutant_breakdown,
};
use aqi_core::period::{available_cities, available_years, default_cities, filter_cities};
use aqi_core::{
    filter_period, DashboardConfig, DashboardPipeline, LoadedDataset, MonthFilter, PeriodSelection,
    PeriodView, PipelineError,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Air-quality dashboard for Indian cities", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults to $AQI_CONFIG when set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// National snapshot: metro annual averages and period insights
    Snapshot(PeriodArgs),
    /// Per-city averages joined with coordinates
    Hotspots(PeriodArgs),
    /// Calendar, category, heatmap and pollutant views for one city
    City {
        name: String,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Daily trends and seasonal (monthly) profiles side by side
    Compare {
        /// Cities to compare; defaults to the preferred metros
        cities: Vec<String>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// List selectable years and cities
    Years,
    /// Parse a snapshot file and report what was found
    Inspect { path: PathBuf },
}

#[derive(Args, Debug, Clone)]
struct PeriodArgs {
    /// Calendar year (defaults to the most recent year in the data)
    #[arg(long)]
    year: Option<i32>,

    /// "All Months", a month name, or 1-12
    #[arg(long, default_value = "All Months")]
    month: MonthFilter,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// 2 when no data source could be loaded, 1 for every other failure.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::DataUnavailable { .. }) => 2,
        _ => 1,
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Inspect { path } = &cli.command {
        return inspect(path);
    }

    let config_path = cli
        .config
        .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));
    let config =
        DashboardConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    let pipeline = DashboardPipeline::new(&config)?;

    let dataset = pipeline.load()?;
    info!(
        source = dataset.source.as_str(),
        rows = dataset.df.height(),
        "dataset ready"
    );
    render::status(&dataset);

    match cli.command {
        Command::Snapshot(args) => snapshot(&dataset, &config, &args),
        Command::Hotspots(args) => hotspots(&dataset, &config, &args),
        Command::City { name, period } => city(&dataset, &config, &name, &period),
        Command::Compare { cities, period } => compare(&dataset, &config, cities, &period),
        Command::Years => years(&dataset),
        Command::Inspect { .. } => Ok(()),
    }
}

fn selection(dataset: &LoadedDataset, args: &PeriodArgs) -> Result<PeriodSelection> {
    let years = available_years(&dataset.df)?;
    if let Some(year) = args.year {
        if !years.contains(&year) {
            warn!(year, "no records for the requested year");
        }
    }

    Ok(PeriodSelection {
        year: args.year.or_else(|| years.first().copied()),
        month: args.month,
        cities: Vec::new(),
    })
}

fn period_view(dataset: &LoadedDataset, selection: &PeriodSelection) -> Result<Option<PeriodView>> {
    let view = filter_period(&dataset.df, selection)?;
    if !view.selectable {
        println!("No year can be selected: the dataset has no dated records.");
        return Ok(None);
    }
    Ok(Some(view))
}

fn snapshot(dataset: &LoadedDataset, config: &DashboardConfig, args: &PeriodArgs) -> Result<()> {
    let selection = selection(dataset, args)?;
    let Some(view) = period_view(dataset, &selection)? else {
        return Ok(());
    };
    let Some(year) = selection.year else {
        return Ok(());
    };

    println!("\nKey Metro Annual Average AQI ({year})");
    let metros = metro_annual_averages(&dataset.df, year, &config.metro_cities)?;
    if metros.is_empty() {
        println!("No annual AQI data available for key metro cities in {year}.");
    } else {
        println!("{}", render::metro_table(&metros, &config.theme));
    }

    println!("\nInsights for {}", selection.label());
    if view.is_empty() {
        println!("No data available for the selected period. Try selecting 'All Months'.");
        return Ok(());
    }
    match period_insights(&view.df)? {
        Some(insights) => println!("{}", render::insights_table(&insights)),
        None => println!("AQI statistics could not be computed for the selected period."),
    }
    Ok(())
}

fn hotspots(dataset: &LoadedDataset, config: &DashboardConfig, args: &PeriodArgs) -> Result<()> {
    let selection = selection(dataset, args)?;
    let Some(view) = period_view(dataset, &selection)? else {
        return Ok(());
    };

    let coordinates = match load_coordinates(&config.coordinates_path) {
        Ok(coordinates) => coordinates,
        Err(err) => {
            warn!(path = %config.coordinates_path.display(), error = %err, "coordinates unavailable");
            println!("Map data unavailable: {err}");
            return Ok(());
        }
    };

    let spots = city_hotspots(&view.df, &coordinates)?;
    println!("\nCity AQI Hotspots ({})", selection.label());
    if spots.is_empty() {
        println!("No cities with both AQI data and coordinates for this period.");
    } else {
        println!("{}", render::hotspot_table(&spots, &config.theme));
    }
    Ok(())
}

fn city(
    dataset: &LoadedDataset,
    config: &DashboardConfig,
    name: &str,
    args: &PeriodArgs,
) -> Result<()> {
    let selection = selection(dataset, args)?;
    let Some(view) = period_view(dataset, &selection)? else {
        return Ok(());
    };
    let Some(year) = selection.year else {
        return Ok(());
    };

    let annual = filter_period(
        &filter_cities(&dataset.df, &[name.to_string()])?,
        &PeriodSelection {
            year: Some(year),
            ..PeriodSelection::default()
        },
    )?;
    if annual.is_empty() {
        println!("No data available for {name} in {year}. Please select a different year.");
        return Ok(());
    }
    let cells = calendar_grid(&annual.df, name, year)?;

    println!("\n{} - Analysis for {year}", name.to_uppercase());
    println!("{}", render::calendar_text(&cells));

    let city_period = filter_cities(&view.df, &[name.to_string()])?;
    if city_period.height() == 0 {
        println!(
            "No specific data for {name} in {}. Try selecting 'All Months' for more details.",
            selection.label()
        );
        return Ok(());
    }

    println!("\nAQI Day Categories ({})", selection.month);
    let categories = category_distribution(&city_period, name)?;
    println!("{}", render::category_table(&categories, &config.theme));

    println!("\nDaily AQI Heatmap ({})", selection.month);
    println!("{}", render::heatmap_table(&daily_heatmap(&city_period, name)?));

    println!("\nDominant Pollutant Distribution");
    let pollutants = pollutant_breakdown(&city_period, name)?;
    if pollutants.is_empty() {
        println!("No dominant pollutant data (excluding 'Other') recorded for {name} in this period.");
    } else {
        println!("{}", render::pollutant_table(&pollutants, &config.theme));
    }
    Ok(())
}

fn compare(
    dataset: &LoadedDataset,
    config: &DashboardConfig,
    cities: Vec<String>,
    args: &PeriodArgs,
) -> Result<()> {
    let mut selection = selection(dataset, args)?;
    selection.cities = if cities.is_empty() {
        default_cities(&available_cities(&dataset.df)?, &config.preferred_cities)
    } else {
        cities
    };
    let Some(view) = period_view(dataset, &selection)? else {
        return Ok(());
    };
    let Some(year) = selection.year else {
        return Ok(());
    };
    if selection.cities.is_empty() {
        println!("No cities to compare.");
        return Ok(());
    }

    if selection.cities.len() > 1 {
        println!("\nAQI Trend Comparison ({})", selection.label());
        let trends = city_trends(&view.df, &selection.cities)?;
        if trends.is_empty() {
            println!("No data for the selected cities in this period.");
        } else {
            println!("{}", render::trend_table(&trends));
        }
    }

    let mut profiles = Vec::with_capacity(selection.cities.len());
    for city in &selection.cities {
        let profile = monthly_profile(&dataset.df, year, city)?;
        if profile.iter().all(Option::is_none) {
            warn!(%city, year, "no monthly data for city");
            continue;
        }
        profiles.push((city.clone(), profile));
    }

    println!("\nSeasonal AQI Profile ({year})");
    if profiles.is_empty() {
        println!("No monthly data for the selected cities in {year}.");
    } else {
        println!("{}", render::monthly_table(&profiles));
    }
    Ok(())
}

fn years(dataset: &LoadedDataset) -> Result<()> {
    let years = available_years(&dataset.df)?;
    let cities = available_cities(&dataset.df)?;
    if years.is_empty() {
        println!("No selectable years.");
    } else {
        let years: Vec<String> = years.iter().map(i32::to_string).collect();
        println!("Years: {}", years.join(", "));
    }
    println!("Cities ({}): {}", cities.len(), cities.join(", "));
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot = aqi_parser::parse_snapshot(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let columns: Vec<&str> = snapshot
        .df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    println!("Format: {}", snapshot.format);
    println!("Rows: {}", snapshot.height());
    println!("Columns: {}", columns.join(", "));
    if snapshot.unparsed_dates > 0 {
        println!("Unparseable dates: {}", snapshot.unparsed_dates);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use aqi_core::config::ConfigError;

    use super::*;

    fn unavailable() -> PipelineError {
        PipelineError::DataUnavailable {
            live: "data/2024-03-15.csv not found".to_string(),
            archive: "combined_air_quality.txt not found".to_string(),
        }
    }

    #[test]
    fn data_unavailable_exits_with_status_two() {
        assert_eq!(exit_status(&anyhow::Error::from(unavailable())), 2);

        let wrapped = Err::<(), _>(unavailable())
            .context("failed to load dataset")
            .unwrap_err();
        assert_eq!(exit_status(&wrapped), 2);
    }

    #[test]
    fn other_failures_exit_with_status_one() {
        let config = PipelineError::Config(ConfigError::InvalidValue {
            key: "cache_ttl_secs",
            message: "must be greater than zero".to_string(),
        });
        assert_eq!(exit_status(&anyhow::Error::from(config)), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("unreadable snapshot")), 1);
    }

    #[test]
    fn compare_takes_cities_and_period() {
        let cli = Cli::try_parse_from(["aqi", "compare", "Delhi", "Mumbai", "--month", "Mar"])
            .unwrap();
        match cli.command {
            Command::Compare { cities, period } => {
                assert_eq!(cities, ["Delhi", "Mumbai"]);
                assert_eq!(period.month, MonthFilter::Month(3));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["aqi", "snapshot", "--city", "Delhi"]).is_err());
    }
}
