mod columns;
mod normalizer;
mod parser;

use crate::market::domain::{mean, HousingType, PriceRecord};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use columns::ColumnIndex;
use parser::RowRejection;

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn { column: &'static str },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "failed to read price table: {}", err),
            DatasetError::Csv(err) => write!(f, "invalid price table data: {}", err),
            DatasetError::MissingColumn { column } => {
                write!(f, "price table is missing required column '{}'", column)
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(err) => Some(err),
            DatasetError::Csv(err) => Some(err),
            DatasetError::MissingColumn { .. } => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Immutable, fully typed price table. Built once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct PriceDataset {
    records: Vec<PriceRecord>,
    cities: Vec<String>,
    housing_types: Vec<HousingType>,
    skipped_rows: usize,
}

impl PriceDataset {
    pub const DEFAULT_SEPARATOR: u8 = b';';

    pub fn from_path<P: AsRef<Path>>(path: P, separator: u8) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file, separator)?;
        info!(
            path = %path.display(),
            records = dataset.records.len(),
            cities = dataset.cities.len(),
            skipped = dataset.skipped_rows,
            "price table loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R, separator: u8) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let index = ColumnIndex::resolve(csv_reader.headers()?).map_err(|column| {
            DatasetError::MissingColumn {
                column: column.header(),
            }
        })?;

        let mut records = Vec::new();
        let mut skipped_rows = 0;
        for (line, row) in csv_reader.records().enumerate() {
            let row = row?;
            match parser::parse_row(&index, &row) {
                Ok(record) => records.push(record),
                Err(RowRejection::EmptyCity) => {
                    skipped_rows += 1;
                    warn!(row = line + 1, "skipping price row without a city");
                }
                Err(RowRejection::UnknownHousingType(raw)) => {
                    skipped_rows += 1;
                    warn!(row = line + 1, housing_type = %raw, "skipping price row with unknown housing type");
                }
            }
        }

        Ok(Self::from_records(records).with_skipped(skipped_rows))
    }

    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        let mut cities: Vec<String> = Vec::new();
        let mut housing_types: Vec<HousingType> = Vec::new();
        for record in &records {
            if !cities.iter().any(|city| city == &record.city) {
                cities.push(record.city.clone());
            }
            if !housing_types.contains(&record.housing_type) {
                housing_types.push(record.housing_type);
            }
        }
        housing_types.sort();

        Self {
            records,
            cities,
            housing_types,
            skipped_rows: 0,
        }
    }

    fn with_skipped(mut self, skipped_rows: usize) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    /// Every loaded record, including those with missing numeric fields.
    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    /// Distinct cities in order of first appearance.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn housing_types(&self) -> &[HousingType] {
        &self.housing_types
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.iter().any(|candidate| candidate == city)
    }

    pub fn records_for_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a PriceRecord> + 'a {
        self.records.iter().filter(move |record| record.city == city)
    }

    /// Mean price per square meter over the whole table, ignoring every filter.
    pub fn corpus_mean_price_per_sqm(&self) -> Option<f64> {
        mean(self.records.iter().map(|record| record.price_per_sqm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "Ciudad;Año;Precio medio/m²;Valor medio de compra;Variación anual (%);Proyección 5 años (%);Tipo de vivienda;Latitud;Longitud\n";

    fn load(body: &str) -> Result<PriceDataset, DatasetError> {
        PriceDataset::from_reader(Cursor::new(format!("{HEADER}{body}")), b';')
    }

    #[test]
    fn loads_comma_decimal_rows() {
        let dataset = load("Madrid;2020;3500,5;280000;2,1;8,5;Nueva;40,4168;-3,7038\n")
            .expect("table loads");
        let record = &dataset.records()[0];
        assert_eq!(record.city, "Madrid");
        assert_eq!(record.year, Some(2020));
        assert_eq!(record.housing_type, HousingType::New);
        assert_eq!(record.price_per_sqm, Some(3500.5));
        assert_eq!(record.annual_variation_pct, Some(2.1));
        assert_eq!(record.coordinates(), Some((40.4168, -3.7038)));
    }

    #[test]
    fn unparsable_numbers_become_missing_not_zero() {
        let dataset = load("Sevilla;2021;n/d;;-;4;Segunda mano;37,38;-5,98\n").expect("table loads");
        let record = &dataset.records()[0];
        assert_eq!(record.price_per_sqm, None);
        assert_eq!(record.purchase_value, None);
        assert_eq!(record.annual_variation_pct, None);
        assert_eq!(record.five_year_projection_pct, Some(4.0));
    }

    #[test]
    fn rows_without_city_or_known_type_are_skipped() {
        let dataset = load(
            ";2020;1000;100000;1;1;Nueva;0;0\nBilbao;2020;1000;100000;1;1;Chalet;0;0\nBilbao;2020;1000;100000;1;1;Usada;0;0\n",
        )
        .expect("table loads");
        assert_eq!(dataset.records().len(), 1);
        assert_eq!(dataset.skipped_rows(), 2);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let csv = "Ciudad;Año;Precio medio/m²;Valor medio de compra;Variación anual (%);Proyección 5 años (%);Tipo de vivienda;Longitud\nMadrid;2020;1;1;1;1;Nueva;1\n";
        let error = PriceDataset::from_reader(Cursor::new(csv), b';').expect_err("column missing");
        match error {
            DatasetError::MissingColumn { column } => assert_eq!(column, "Latitud"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn separator_is_configurable() {
        let csv = "Ciudad,Año,Precio medio/m²,Valor medio de compra,Variación anual (%),Proyección 5 años (%),Tipo de vivienda,Latitud,Longitud\nValencia,2019,1800.5,150000,3.2,10,Nueva,39.47,-0.38\n";
        let dataset = PriceDataset::from_reader(Cursor::new(csv), b',').expect("table loads");
        assert_eq!(dataset.records()[0].price_per_sqm, Some(1800.5));
    }

    #[test]
    fn cities_keep_first_seen_order_and_corpus_mean_ignores_missing() {
        let dataset = load(
            "Zaragoza;2020;1000;1;1;1;Nueva;0;0\nAlicante;2020;;1;1;1;Usada;0;0\nZaragoza;2021;3000;1;1;1;Usada;0;0\n",
        )
        .expect("table loads");
        assert_eq!(dataset.cities(), &["Zaragoza".to_string(), "Alicante".to_string()]);
        assert_eq!(
            dataset.housing_types(),
            &[HousingType::New, HousingType::Resale]
        );
        assert_eq!(dataset.corpus_mean_price_per_sqm(), Some(2000.0));
        assert_eq!(dataset.records_for_city("Zaragoza").count(), 2);
    }

    #[test]
    fn short_and_long_rows_keep_the_load_going() {
        let dataset = load(
            "Lugo;2022;1100;95000;1;3;Nueva;43,01;-7,55\nLugo;2023;1150;98000;1,5;3;Nueva\nOurense;2023;1000;90000;1;2;Segunda mano;42,34;-7,86;sobrante\n",
        )
        .expect("ragged rows do not abort the table");

        assert_eq!(dataset.records().len(), 3);
        assert_eq!(dataset.skipped_rows(), 0);
        let short = &dataset.records()[1];
        assert_eq!(short.price_per_sqm, Some(1150.0));
        assert_eq!(short.coordinates(), None);
        assert_eq!(dataset.records()[2].coordinates(), Some((42.34, -7.86)));
    }

    #[test]
    fn row_cut_before_housing_type_is_skipped() {
        let dataset = load("Lugo;2022;1100;95000;1;3;Nueva;43,01;-7,55\nLugo;2023;1150\n")
            .expect("table loads");
        assert_eq!(dataset.records().len(), 1);
        assert_eq!(dataset.skipped_rows(), 1);
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = PriceDataset::from_path("./does-not-exist.csv", b';').expect_err("io error");
        assert!(matches!(error, DatasetError::Io(_)));
    }
}
