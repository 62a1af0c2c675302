//! Parsing for the BLS LAUS "14-month county" table
//! (https://www.bls.gov/web/metro/laucntycur14.txt).

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use crate::structures::CountyMonth;

pub const CLEAN_FILE_NAME: &str = "bls_monthly_unemployment_by_county.csv";

lazy_static! {
    static ref PRELIMINARY: Regex = Regex::new(r"\(p\)").unwrap();
}

/// Parses one raw line. Header, footnote and blank lines give `Ok(None)`.
pub fn parse_line(raw: &str) -> Result<Option<CountyMonth>> {
    let line = raw.trim();
    if !line.starts_with("CN") {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let (laus, fips_state, fips_county, area, period, force, employed, unemployed, rate) =
        match fields.as_slice() {
            [a, b, c, d, e, f, g, h, i] => (*a, *b, *c, *d, *e, *f, *g, *h, *i),
            _ => bail!("expected 9 fields, found {}", fields.len()),
        };
    let (county, state) = split_area(area)?;
    let date = parse_period(period)?;
    let month_name = period
        .split('-')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    Ok(Some(CountyMonth {
        laus_area_code: laus.to_string(),
        fips_state: fips_state.to_string(),
        fips_county: fips_county.to_string(),
        area: area.to_string(),
        county,
        state,
        month_name,
        month: date.month(),
        year: date.year(),
        date,
        civ_labor_force: parse_count(force)?,
        employed: parse_count(employed)?,
        unemployed: parse_count(unemployed)?,
        unemployed_rate: rate
            .parse()
            .with_context(|| format!("bad unemployment rate {:?}", rate))?,
    }))
}

fn split_area(area: &str) -> Result<(String, String)> {
    let bits: Vec<&str> = area.split(',').map(str::trim).collect();
    match bits.as_slice() {
        [county, state] => Ok((county.to_string(), state.to_string())),
        _ if area.contains("District") => {
            Ok(("District of Columbia".to_string(), "DC".to_string()))
        }
        _ => Err(anyhow!("cannot split area {:?} into county and state", area)),
    }
}

/// `Jan-20` and `Dec-20(p)` both name the first of their month.
fn parse_period(period: &str) -> Result<NaiveDate> {
    let clean = PRELIMINARY.replace_all(period, "");
    NaiveDate::parse_from_str(&format!("01-{}", clean.trim()), "%d-%b-%y")
        .with_context(|| format!("bad period {:?}", period))
}

fn parse_count(num: &str) -> Result<u64> {
    num.replace(',', "")
        .parse()
        .with_context(|| format!("bad count {:?}", num))
}

/// Parses every data row, skipping (and logging) the ones that don't make sense.
pub fn parse_table<R: BufRead>(input: R) -> Result<Vec<CountyMonth>> {
    let mut rows = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(e) => log::warn!("Skipping line {}: {:#}", n + 1, e),
        }
    }
    Ok(rows)
}

pub fn write_csv<W: Write>(rows: &[CountyMonth], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// The CSV lands next to an absolute input, otherwise in the working directory.
pub fn output_path(input: &Path) -> Result<PathBuf> {
    let dir = match input.parent() {
        Some(parent) if input.is_absolute() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    Ok(dir.join(CLEAN_FILE_NAME))
}
