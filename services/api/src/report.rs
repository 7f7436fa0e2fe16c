use crate::infra::load_query_service;
use clap::Args;
use housing_lens::config::AppConfig;
use housing_lens::error::AppError;
use housing_lens::market::{
    HistoryEntry, HousingQuery, HousingType, MortgageTerms, QueryOutcome, ViabilityTier,
};

#[derive(Args, Debug)]
pub(crate) struct QueryArgs {
    /// Buyer age in years
    #[arg(long)]
    pub(crate) age: u8,
    /// Gross annual income in euros
    #[arg(long)]
    pub(crate) income: f64,
    /// City name exactly as it appears in the price table
    #[arg(long)]
    pub(crate) city: String,
    /// new / resale (Spanish labels such as "Nueva" are accepted)
    #[arg(long)]
    pub(crate) housing_type: HousingType,
    /// Number of recommendations to print
    #[arg(long)]
    pub(crate) top: Option<usize>,
}

pub(crate) fn run_query(config: &AppConfig, args: QueryArgs) -> Result<(), AppError> {
    let service = load_query_service(config)?;
    let outcome = service.run(HousingQuery {
        age: args.age,
        annual_income: args.income,
        city: args.city,
        housing_type: args.housing_type,
        top: args.top,
    })?;

    print!("{}", render_query_report(&outcome, service.terms()));
    Ok(())
}

pub(crate) fn run_history(config: &AppConfig) -> Result<(), AppError> {
    let service = load_query_service(config)?;
    let entries = service.history()?;
    print!("{}", render_history(&entries));
    Ok(())
}

fn figure(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}"),
        None => "n/a".to_string(),
    }
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub(crate) fn render_query_report(outcome: &QueryOutcome, terms: &MortgageTerms) -> String {
    let indicators = &outcome.indicators;
    let mut lines = vec![
        format!("Housing report: {} ({})", outcome.city, outcome.housing_type),
        format!(
            "Mortgage assumptions: {:.2}% over {} years",
            terms.annual_rate_pct, terms.term_years
        ),
        String::new(),
        format!("Indicators ({} records)", indicators.record_count),
        format!(
            "- Mean price per m²: {}",
            figure(indicators.mean_price_per_sqm, 2)
        ),
        format!(
            "- Mean purchase value: {}",
            figure(indicators.mean_purchase_value, 0)
        ),
        format!(
            "- Mean 5-year projection: {}%",
            figure(indicators.mean_five_year_projection_pct, 1)
        ),
    ];
    lines.extend(indicators.by_housing_type.iter().map(|by_type| {
        format!(
            "  {}: {} records, {} €/m², variation {}%",
            by_type.label,
            by_type.record_count,
            figure(by_type.mean_price_per_sqm, 2),
            figure(by_type.mean_annual_variation_pct, 1)
        )
    }));

    if !outcome.trends.is_empty() {
        lines.push(String::new());
        lines.push("Price trend".to_string());
        lines.extend(outcome.trends.iter().map(|point| {
            format!(
                "- {} {}: {:.2} €/m²",
                point.year, point.housing_type, point.mean_price_per_sqm
            )
        }));
    }

    let selected = &outcome.selected_affordability;
    lines.push(String::new());
    lines.push(format!("Affordability in {}", selected.city));
    if selected.viability_tier == ViabilityTier::Unknown {
        lines.push("- No purchase value available".to_string());
    } else {
        lines.push(format!(
            "- Monthly payment: {} € ({}% of income)",
            figure(selected.monthly_payment, 2),
            figure(selected.income_fraction_pct, 2)
        ));
    }
    lines.push(format!("- Tier: {}", selected.viability_tier.label()));

    let map = &outcome.affordability_map;
    lines.push(String::new());
    lines.push(format!("Affordability across {} regions", map.regions.len()));
    lines.extend(
        map.legend
            .iter()
            .map(|entry| format!("- {}: {}", entry.label, map.count(entry.tier))),
    );

    lines.push(String::new());
    lines.push(format!(
        "Top recommendations ({} of {} ranked)",
        outcome.recommendations.len(),
        outcome.ranked_total
    ));
    if outcome.recommendations.is_empty() {
        lines.push("- none".to_string());
    }
    lines.extend(
        outcome
            .recommendations
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                format!(
                    "{}. {} ({}) score {:.2}: {:.0} €, {:.2} €/month, projection {:.1}%",
                    rank + 1,
                    entry.city,
                    entry
                        .year
                        .map_or_else(|| "n/a".to_string(), |year| year.to_string()),
                    entry.composite_score,
                    entry.purchase_value,
                    entry.monthly_payment,
                    entry.five_year_projection_pct
                )
            }),
    );

    lines.push(String::new());
    lines.push(format!("Guidance: {}", outcome.guidance_message));
    finish(lines)
}

pub(crate) fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No searches recorded yet\n".to_string();
    }

    let mut lines = vec![format!("Search history ({} entries)", entries.len())];
    lines.extend(entries.iter().map(|entry| {
        format!(
            "- {} | age {} | income {:.0} | {} €/m² | {} € | {}%",
            entry.city,
            entry.age,
            entry.annual_income,
            figure(entry.price_per_sqm, 2),
            figure(entry.purchase_value, 0),
            figure(entry.five_year_projection_pct, 1)
        )
    }));
    finish(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use housing_lens::market::{
        CsvHistoryLog, HistoryStore, HousingQueryService, PriceDataset, QueryLimits,
    };
    use std::io::Cursor;
    use std::sync::Arc;

    const TABLE: &str = "\
Ciudad;Año;Precio medio/m²;Valor medio de compra;Variación anual (%);Proyección 5 años (%);Tipo de vivienda;Latitud;Longitud
Sevilla;2022;1900;180000;2,5;9;Nueva;37,38;-5,98
Sevilla;2023;2000;200000;3;10;Nueva;37,39;-5,99
Cádiz;2023;2200;;1;4;Nueva;36,53;-6,29
";

    fn outcome(dir: &std::path::Path) -> (QueryOutcome, CsvHistoryLog) {
        let dataset = PriceDataset::from_reader(Cursor::new(TABLE), b';').expect("table loads");
        let service = HousingQueryService::new(
            Arc::new(dataset),
            Arc::new(CsvHistoryLog::new(dir.join("history.csv"))),
            MortgageTerms::default(),
            QueryLimits::default(),
        );
        let outcome = service
            .run(HousingQuery {
                age: 26,
                annual_income: 30_000.0,
                city: "Sevilla".to_string(),
                housing_type: HousingType::New,
                top: None,
            })
            .expect("query runs");
        (outcome, CsvHistoryLog::new(dir.join("history.csv")))
    }

    #[test]
    fn query_report_lists_every_section() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (outcome, _) = outcome(dir.path());
        let text = render_query_report(&outcome, &MortgageTerms::default());

        assert!(text.starts_with("Housing report: Sevilla (New)"));
        assert!(text.contains("Mortgage assumptions: 3.50% over 30 years"));
        assert!(text.contains("- 2022 New: 1900.00 €/m²"));
        assert!(text.contains("Tier: Moderate"));
        assert!(text.contains("Top recommendations (2 of 2 ranked)"));
        assert!(text.contains("1. Sevilla (2023)"));
        assert!(text.contains("Guidance: Compare different areas"));
    }

    #[test]
    fn query_report_separates_sections_with_single_blank_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (outcome, _) = outcome(dir.path());
        let text = render_query_report(&outcome, &MortgageTerms::default());

        assert!(text.contains("over 30 years\n\nIndicators (2 records)\n"));
        assert!(text.contains("\n\nAffordability in Sevilla\n- Monthly payment: "));
        assert!(!text.contains("\n\n\n"));
        assert!(text.ends_with("budget and preferences.\n"));
    }

    #[test]
    fn history_report_shows_missing_figures() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (_, log) = outcome(dir.path());
        let entries = log.load_all().expect("history loads");

        let text = render_history(&entries);
        assert!(text.starts_with("Search history (1 entries)"));
        assert!(text.contains("Sevilla | age 26 | income 30000"));
        assert_eq!(render_history(&[]), "No searches recorded yet\n");
    }
}
