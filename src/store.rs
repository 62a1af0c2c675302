use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::structures::CountyMonth;

/// sled store of cleaned BLS rows keyed `STATE|county|YYYY-MM-DD`, so a
/// prefix scan yields one county in date order.
#[derive(Debug, Clone)]
pub struct CountyStore {
    db: sled::Db,
}

impl CountyStore {
    pub fn open(path: impl AsRef<Path>, compression: bool) -> Result<Self> {
        let db = sled::Config::default()
            .use_compression(compression)
            .path(path.as_ref())
            .open()?;
        log::info!(
            "Store opened: {} (recovered: {}, entries: {})",
            path.as_ref().display(),
            db.was_recovered(),
            db.len()
        );
        Ok(CountyStore { db })
    }

    pub fn batch_write(&self, rows: &[CountyMonth]) -> Result<usize> {
        let mut batch = sled::Batch::default();
        for row in rows {
            batch.insert(row_key(&row.county, &row.state, &row.date.to_string()), encode(row)?);
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        Ok(rows.len())
    }

    pub fn county_series(&self, county: &str, state: &str) -> Result<Vec<CountyMonth>> {
        self.db
            .scan_prefix(county_prefix(county, state))
            .map(|entry| -> Result<CountyMonth> {
                let (_, value) = entry?;
                Ok(bincode::deserialize(&value)?)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

fn county_prefix(county: &str, state: &str) -> Vec<u8> {
    format!("{}|{}|", state, county).into_bytes()
}

fn row_key(county: &str, state: &str, date: &str) -> Vec<u8> {
    let mut key = county_prefix(county, state);
    key.extend_from_slice(date.as_bytes());
    key
}

fn encode(input: impl Serialize) -> Result<Vec<u8>> {
    Ok(bincode::serialize(&input)?)
}
