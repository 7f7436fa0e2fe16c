#![allow(dead_code)]

use housing_lens::market::{
    HistoryEntry, HistoryError, HistoryStore, HousingQueryService, MortgageTerms, PriceDataset,
    QueryLimits,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

pub const PRICE_TABLE: &str = "\
Ciudad ; Año ; Precio medio/m² ; Valor medio de compra ; Variación anual (%) ; Proyección 5 años (%) ; Tipo de vivienda ; Latitud ; Longitud
Madrid;2022;3900,5;390000;4,2;12,5;Nueva;40,4168;-3,7038
Madrid;2023;4100;410000;5,1;13;Nueva;40,4170;-3,7040
Madrid;2023;3500;320000;-1,5;8;Segunda mano;40,4160;-3,7030
Madrid;2024;n/d;330000;2;9;Segunda mano;40,4165;-3,7035
Valencia;2023;2100;190000;3,3;10;Nueva;39,4699;-0,3763
Valencia;2023;1800;150000;0;6,5;Segunda mano;39,4700;-0,3760
Teruel;2023;900;85000;-2;-3;Segunda mano;40,3440;-1,1069
Soria;2023;1000;;1;4;Nueva;41,7640;-2,4688
";

pub fn dataset() -> PriceDataset {
    PriceDataset::from_reader(Cursor::new(PRICE_TABLE), b';').expect("fixture table loads")
}

#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        self.entries
            .lock()
            .map_err(|_| HistoryError::Poisoned)?
            .push(entry.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| HistoryError::Poisoned)?
            .clone())
    }
}

pub fn service() -> (HousingQueryService<InMemoryHistory>, Arc<InMemoryHistory>) {
    let history = Arc::new(InMemoryHistory::default());
    let service = HousingQueryService::new(
        Arc::new(dataset()),
        history.clone(),
        MortgageTerms::default(),
        QueryLimits::default(),
    );
    (service, history)
}
