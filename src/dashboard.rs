use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::category::{Category, Field, PRICE_COLUMN};
use crate::dataset::{Dataset, Table};
use crate::error::Result;
use crate::normalize::{normalize_rows, DropCounts, ListingSource, NormalizeReport, NormalizedRecord};
use crate::parser::fields;

const TOP_ADDRESSES: usize = 5;
const PREVIEW_ROWS: usize = 10;

// Normalized header first, then raw scrape names.
const ADDRESS_NAMES: &[&str] = &["Adresse", "location_text", "location", "localisation"];
const PRICE_NAMES: &[&str] = &["Prix", "price_text", "price"];
const SURFACE_NAMES: &[&str] = &["Superficie", "surface"];
const ROOMS_NAMES: &[&str] = &["Pieces", "Pièces", "nombre_pieces", "rooms"];
const BATHS_NAMES: &[&str] = &["Salles_bain", "salles_de_bain", "bathrooms"];
const ATTRIBUTES_NAMES: &[&str] = &["attributes_text", "description", "details"];
const TITLE_NAMES: &[&str] = &["title", "titre"];

struct Columns {
    address: Option<usize>,
    price: Option<usize>,
    surface: Option<usize>,
    rooms: Option<usize>,
    baths: Option<usize>,
    attributes: Option<usize>,
    title: Option<usize>,
}

impl Columns {
    fn resolve(table: &Table) -> Self {
        Columns {
            address: table.column(ADDRESS_NAMES),
            price: table.column(PRICE_NAMES),
            surface: table.column(SURFACE_NAMES),
            rooms: table.column(ROOMS_NAMES),
            baths: table.column(BATHS_NAMES),
            attributes: table.column(ATTRIBUTES_NAMES),
            title: table.column(TITLE_NAMES),
        }
    }
}

struct TableRow<'a> {
    row: &'a [String],
    cols: &'a Columns,
}

impl TableRow<'_> {
    fn cell(&self, col: Option<usize>) -> &str {
        col.and_then(|c| self.row.get(c)).map(String::as_str).unwrap_or("")
    }

    /// Dedicated column when it holds a value, else the free-text columns.
    fn derive<T>(
        &self,
        col: Option<usize>,
        parse_cell: impl Fn(&str) -> Option<T>,
        extract: fn(&str) -> Option<T>,
    ) -> Option<T> {
        parse_cell(self.cell(col))
            .or_else(|| extract(self.cell(self.cols.attributes)))
            .or_else(|| extract(self.cell(self.cols.title)))
    }
}

impl ListingSource for TableRow<'_> {
    fn address_text(&self) -> &str {
        self.cell(self.cols.address)
    }
    fn price_text(&self) -> &str {
        self.cell(self.cols.price)
    }
    fn surface(&self) -> Option<f64> {
        self.derive(self.cols.surface, fields::parse_surface_cell, fields::extract_surface)
    }
    fn rooms(&self) -> Option<u32> {
        self.derive(
            self.cols.rooms,
            |c| fields::parse_count_cell(c, fields::extract_rooms),
            fields::extract_rooms,
        )
    }
    fn bathrooms(&self) -> Option<u32> {
        self.derive(
            self.cols.baths,
            |c| fields::parse_count_cell(c, fields::extract_bathrooms),
            fields::extract_bathrooms,
        )
    }
}

/// Re-derive typed columns from a saved table, raw or already normalized.
/// Running it on its own output changes nothing.
pub fn reprocess(table: &Table, category: Category) -> NormalizeReport {
    let cols = Columns::resolve(table);
    normalize_rows(
        table.rows.iter().map(|row| TableRow { row, cols: &cols }),
        category,
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMean {
    pub column: &'static str,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    pub columns: Vec<&'static str>,
    /// `None` where fewer than two paired values exist or a side is constant.
    pub matrix: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub category: Category,
    pub count: usize,
    pub dropped: DropCounts,
    pub means: Vec<ColumnMean>,
    pub top_addresses: Vec<(String, usize)>,
    pub correlation: Option<Correlation>,
    pub preview: Vec<NormalizedRecord>,
}

pub fn summarize(dataset: &Dataset, dropped: DropCounts) -> Summary {
    let spec = dataset.category.spec();
    let records = &dataset.records;

    let means = spec
        .fields
        .iter()
        .map(|&field| ColumnMean {
            column: field.column(),
            mean: mean(records.iter().filter_map(|r| field_value(r, field))),
        })
        .collect();

    let top_addresses = records
        .iter()
        .map(|r| r.adresse.as_str())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(TOP_ADDRESSES)
        .map(|(addr, n)| (addr.to_string(), n))
        .collect();

    Summary {
        category: dataset.category,
        count: records.len(),
        dropped,
        means,
        top_addresses,
        correlation: correlation(dataset),
        preview: records.iter().take(PREVIEW_ROWS).cloned().collect(),
    }
}

/// Load a category's saved dataset and summarize it.
pub fn load_summary(data_dir: &Path, category: Category) -> Result<Summary> {
    let table = Table::load(&Dataset::path_in(data_dir, category))?;
    let report = reprocess(&table, category);
    let dataset = Dataset::new(report.category, report.records);
    Ok(summarize(&dataset, report.dropped))
}

fn field_value(rec: &NormalizedRecord, field: Field) -> Option<f64> {
    match field {
        Field::Superficie => rec.superficie,
        Field::Pieces => rec.pieces.map(f64::from),
        Field::SallesBain => rec.salles_bain.map(f64::from),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn correlation(dataset: &Dataset) -> Option<Correlation> {
    let spec = dataset.category.spec();
    let mut columns = vec![PRICE_COLUMN];
    let mut series: Vec<Vec<Option<f64>>> =
        vec![dataset.records.iter().map(|r| Some(r.prix as f64)).collect()];

    for &field in spec.fields {
        let values: Vec<Option<f64>> = dataset.records.iter().map(|r| field_value(r, field)).collect();
        if values.iter().any(Option::is_some) {
            columns.push(field.column());
            series.push(values);
        }
    }
    if columns.len() < 2 {
        return None;
    }

    let matrix = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Some(Correlation { columns, matrix })
}

/// Pearson coefficient over rows where both values are present.
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

pub fn render_text(summary: &Summary) -> String {
    let cat = summary.category;
    let spec = cat.spec();
    let mut lines = vec![
        format!("### Données traitées - {}", cat),
        spec.columns().join(" | "),
    ];
    for rec in &summary.preview {
        let mut cells = vec![rec.adresse.clone(), rec.prix.to_string()];
        for &field in spec.fields {
            cells.push(field_value(rec, field).map(|v| v.to_string()).unwrap_or_else(|| "-".into()));
        }
        lines.push(cells.join(" | "));
    }

    lines.push(String::new());
    lines.push("### Statistiques générales".to_string());
    lines.push(format!("Nombre de {}: {}", cat.label().to_lowercase(), summary.count));
    if summary.dropped.total() > 0 {
        lines.push(format!(
            "Lignes écartées: {} (prix: {}, adresse: {})",
            summary.dropped.total(),
            summary.dropped.missing_price,
            summary.dropped.missing_address
        ));
    }
    for m in &summary.means {
        let (label, unit) = match m.column {
            "Superficie" => ("Superficie moyenne", " m²"),
            "Pieces" => ("Moyenne de pièces", ""),
            _ => ("Moyenne de salles de bain", ""),
        };
        lines.push(match m.mean {
            Some(v) => format!("{}: {:.1}{}", label, v, unit),
            None => format!("{}: -", label),
        });
    }

    lines.push(String::new());
    lines.push(format!("#### Répartition géographique (top {})", TOP_ADDRESSES));
    for (addr, n) in &summary.top_addresses {
        lines.push(format!("{:>5}  {}", n, addr));
    }

    lines.push(String::new());
    lines.push("#### Corrélation".to_string());
    match &summary.correlation {
        Some(corr) => {
            let header: String = corr.columns.iter().map(|c| format!("{:>12}", c)).collect();
            lines.push(format!("{:>12}{}", "", header));
            for (name, row) in corr.columns.iter().zip(&corr.matrix) {
                let cells: String = row
                    .iter()
                    .map(|v| match v {
                        Some(v) => format!("{:>12.2}", v),
                        None => format!("{:>12}", "-"),
                    })
                    .collect();
                lines.push(format!("{:>12}{}", name, cells));
            }
        }
        None => lines.push("Pas assez de données numériques pour une corrélation.".to_string()),
    }
    lines.join("\n")
}
