// crates/aqi/src/render.rs

use aqi_core::calendar::{CalendarCell, HeatmapRow, WEEKDAY_LABELS};
use std::collections::{BTreeMap, BTreeSet};

use aqi_core::insights::{
    CategoryCount, CityAverage, CityTrend, Hotspot, PeriodInsights, PollutantCount,
};
use aqi_core::period::{month_abbreviation, MONTH_ABBREVIATIONS};
use aqi_core::theme::{hex_to_rgb, ThemeConfig};
use aqi_core::{AqiCategory, LoadedDataset};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn colored(text: impl ToString, hex: &str) -> Cell {
    let cell = Cell::new(text.to_string());
    match hex_to_rgb(hex) {
        Some((r, g, b)) => cell.fg(Color::Rgb { r, g, b }),
        None => cell,
    }
}

fn category_cell(category: AqiCategory, theme: &ThemeConfig) -> Cell {
    colored(category, theme.category_color(category))
}

fn number_cell(value: Option<f64>, decimals: usize) -> Cell {
    let text = match value {
        Some(value) => format!("{value:.decimals$}"),
        None => "N/A".to_string(),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn status(dataset: &LoadedDataset) {
    if !dataset.message.is_empty() {
        eprintln!("WARNING: {}", dataset.message);
    }
    println!(
        "Source: {} ({})",
        dataset.source.as_str(),
        dataset.source_path.display()
    );
    println!("Last updated: {}", dataset.last_updated_label());
}

pub fn metro_table(averages: &[CityAverage], theme: &ThemeConfig) -> Table {
    let mut table = table(vec!["City", "Annual Avg AQI", "Category"]);
    for average in averages {
        table.add_row(vec![
            Cell::new(&average.city),
            number_cell(Some(average.mean_index), 1),
            category_cell(average.category(), theme),
        ]);
    }
    table
}

pub fn insights_table(insights: &PeriodInsights) -> Table {
    let mut table = table(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Average AQI (All Cities)"),
        number_cell(Some(insights.national_average), 2),
    ]);
    table.add_row(vec![
        Cell::new("Cities reporting"),
        Cell::new(insights.city_count).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new(format!("Best City ({})", insights.best.city)),
        number_cell(Some(insights.best.mean_index), 2),
    ]);
    table.add_row(vec![
        Cell::new(format!("Worst City ({})", insights.worst.city)),
        number_cell(Some(insights.worst.mean_index), 2),
    ]);
    table
}

pub fn hotspot_table(hotspots: &[Hotspot], theme: &ThemeConfig) -> Table {
    let mut table = table(vec![
        "City",
        "Avg AQI",
        "Category",
        "Dominant Pollutant",
        "Lat",
        "Lon",
    ]);
    for spot in hotspots {
        table.add_row(vec![
            Cell::new(&spot.city),
            number_cell(Some(spot.mean_index), 1),
            category_cell(spot.category, theme),
            colored(&spot.dominant_pollutant, theme.pollutant_color(&spot.dominant_pollutant)),
            number_cell(Some(spot.latitude), 4),
            number_cell(Some(spot.longitude), 4),
        ]);
    }
    table
}

pub fn monthly_table(profiles: &[(String, [Option<f64>; 12])]) -> Table {
    let mut header = vec!["City"];
    header.extend(MONTH_ABBREVIATIONS);
    let mut table = table(header);
    for (city, months) in profiles {
        let mut row = vec![Cell::new(city)];
        row.extend(months.iter().map(|value| number_cell(*value, 0)));
        table.add_row(row);
    }
    table
}

/// One row per date, one column per city; blank where a city has no value.
pub fn trend_table(trends: &[CityTrend]) -> Table {
    let mut header = vec!["Date"];
    header.extend(trends.iter().map(|trend| trend.city.as_str()));
    let mut table = table(header);

    let series: Vec<BTreeMap<_, f64>> = trends
        .iter()
        .map(|trend| trend.points.iter().copied().collect())
        .collect();
    let dates: BTreeSet<_> = trends
        .iter()
        .flat_map(|trend| trend.points.iter().map(|(date, _)| *date))
        .collect();
    for date in dates {
        let mut row = vec![Cell::new(date.format("%Y-%m-%d"))];
        row.extend(series.iter().map(|values| match values.get(&date) {
            Some(value) => number_cell(Some(*value), 0),
            None => Cell::new(""),
        }));
        table.add_row(row);
    }
    table
}

pub fn category_table(counts: &[CategoryCount], theme: &ThemeConfig) -> Table {
    let mut table = table(vec!["AQI Category", "Number of Days"]);
    for count in counts {
        table.add_row(vec![
            category_cell(count.category, theme),
            Cell::new(count.days).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn pollutant_table(counts: &[PollutantCount], theme: &ThemeConfig) -> Table {
    let total: usize = counts.iter().map(|count| count.days).sum();
    let mut table = table(vec!["Pollutant", "Days", "Share"]);
    for count in counts {
        let share = if total == 0 {
            0.0
        } else {
            count.days as f64 * 100.0 / total as f64
        };
        table.add_row(vec![
            colored(&count.pollutant, theme.pollutant_color(&count.pollutant)),
            Cell::new(count.days).set_alignment(CellAlignment::Right),
            Cell::new(format!("{share:.1}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn heatmap_table(rows: &[HeatmapRow]) -> Table {
    let days: Vec<String> = (1..=31).map(|day| day.to_string()).collect();
    let mut header = vec!["Month"];
    header.extend(days.iter().map(String::as_str));
    let mut table = table(header);
    for row in rows {
        let mut cells = vec![Cell::new(month_abbreviation(row.month))];
        cells.extend(row.days.iter().map(|value| match value {
            Some(value) => Cell::new(format!("{value:.0}")).set_alignment(CellAlignment::Right),
            None => Cell::new(""),
        }));
        table.add_row(cells);
    }
    table
}

fn calendar_glyph(category: AqiCategory) -> char {
    match category {
        AqiCategory::Severe => 'X',
        AqiCategory::VeryPoor => 'V',
        AqiCategory::Poor => 'P',
        AqiCategory::Moderate => 'M',
        AqiCategory::Satisfactory => 'S',
        AqiCategory::Good => 'G',
        AqiCategory::Unknown => '.',
    }
}

/// Weekday-by-week text grid, one glyph per day.
pub fn calendar_text(cells: &[CalendarCell]) -> String {
    let weeks = cells.iter().map(|cell| cell.week).max().map_or(0, |w| w as usize + 1);
    let mut grid = vec![vec![' '; weeks]; 7];
    for cell in cells {
        grid[cell.weekday as usize][cell.week as usize] = calendar_glyph(cell.level);
    }

    let mut out = String::new();
    for (label, row) in WEEKDAY_LABELS.iter().zip(grid) {
        out.push_str(label);
        out.push(' ');
        out.extend(row);
        out.push('\n');
    }
    let legend: Vec<String> = AqiCategory::ALL
        .iter()
        .map(|category| format!("{}={}", calendar_glyph(*category), category))
        .collect();
    out.push_str(&legend.join("  "));
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn calendar_text_places_days_by_week_and_weekday() {
        let cells = vec![
            CalendarCell {
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                week: 0,
                weekday: 6,
                level: AqiCategory::Unknown,
                index: None,
            },
            CalendarCell {
                date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                week: 1,
                weekday: 0,
                level: AqiCategory::Poor,
                index: Some(250.0),
            },
        ];

        let text = calendar_text(&cells);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Mon  P");
        assert_eq!(lines[6], "Sun . ");
        assert!(lines[7].contains("V=Very Poor"));
    }

    #[test]
    fn trend_table_aligns_cities_by_date() {
        let day = |d| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
        let trends = vec![
            CityTrend {
                city: "Delhi".to_string(),
                points: vec![(day(5), 390.0), (day(6), 350.0)],
            },
            CityTrend {
                city: "Mumbai".to_string(),
                points: vec![(day(6), 80.0)],
            },
        ];

        let table = trend_table(&trends);
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("2023-01-05"));
        assert!(rendered.contains("390"));
        assert!(rendered.contains("Mumbai"));
    }

    #[test]
    fn pollutant_shares_sum_to_total() {
        let counts = vec![
            PollutantCount {
                pollutant: "PM2.5".to_string(),
                days: 3,
            },
            PollutantCount {
                pollutant: "NO2".to_string(),
                days: 1,
            },
        ];
        let rendered = pollutant_table(&counts, &ThemeConfig::default()).to_string();
        assert!(rendered.contains("75.0%"));
        assert!(rendered.contains("25.0%"));
    }
}
