use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Optional typed columns a category carries on top of `Adresse` and `Prix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Superficie,
    Pieces,
    SallesBain,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::Superficie => "Superficie",
            Field::Pieces => "Pieces",
            Field::SallesBain => "Salles_bain",
        }
    }
}

pub const ADDRESS_COLUMN: &str = "Adresse";
pub const PRICE_COLUMN: &str = "Prix";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Category {
    Villas,
    Terrains,
    Appartements,
}

/// Everything that differs between categories: URL slug, dataset file, columns.
#[derive(Debug)]
pub struct CategorySpec {
    pub slug: &'static str,
    pub file_name: &'static str,
    pub fields: &'static [Field],
}

static VILLAS: CategorySpec = CategorySpec {
    slug: "villas",
    file_name: "Scrapper_villas.csv",
    fields: &[Field::Superficie, Field::Pieces, Field::SallesBain],
};

static TERRAINS: CategorySpec = CategorySpec {
    slug: "terrains",
    file_name: "Scrapper_Terrains.csv",
    fields: &[Field::Superficie],
};

static APPARTEMENTS: CategorySpec = CategorySpec {
    slug: "appartements",
    file_name: "Scrapper_Appartements.csv",
    fields: &[Field::Pieces],
};

impl Category {
    pub const ALL: [Category; 3] = [Category::Villas, Category::Terrains, Category::Appartements];

    pub fn spec(self) -> &'static CategorySpec {
        match self {
            Category::Villas => &VILLAS,
            Category::Terrains => &TERRAINS,
            Category::Appartements => &APPARTEMENTS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Villas => "Villas",
            Category::Terrains => "Terrains",
            Category::Appartements => "Appartements",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl CategorySpec {
    /// Dataset header, in file order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut cols = vec![ADDRESS_COLUMN, PRICE_COLUMN];
        cols.extend(self.fields.iter().map(|f| f.column()));
        cols
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_per_category() {
        assert_eq!(
            Category::Villas.spec().columns(),
            ["Adresse", "Prix", "Superficie", "Pieces", "Salles_bain"]
        );
        assert_eq!(Category::Terrains.spec().columns(), ["Adresse", "Prix", "Superficie"]);
        assert_eq!(Category::Appartements.spec().columns(), ["Adresse", "Prix", "Pieces"]);
    }

    #[test]
    fn apartments_have_no_surface() {
        let spec = Category::Appartements.spec();
        assert!(!spec.has(Field::Superficie));
        assert!(spec.has(Field::Pieces));
    }
}
