use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{GlutenSource, PositiveClaim, QualityFlag};

// Every pattern runs against `normalize_label_text` output: lowercase, no
// diacritics, single spaces.

pub const BASE_SCORE: i32 = 10;
pub const GLUTEN_PENALTY: i32 = 3;
pub const LACTOSE_PENALTY: i32 = 1;
pub const CROSS_CONTAMINATION_PENALTY: i32 = 1;

pub const GLUTEN_CON: &str = "Contiene gluten";
pub const LACTOSE_CON: &str = "Contiene lactosa/derivados";
pub const CROSS_CONTAMINATION_CON: &str = "Riesgo de contaminación cruzada";

#[derive(Debug)]
pub struct GlutenRule {
    pub source: GlutenSource,
    pub pattern: Regex,
}

/// Ordered by `GlutenSource::PRECEDENCE`.
pub static GLUTEN_RULES: Lazy<Vec<GlutenRule>> = Lazy::new(|| {
    GlutenSource::PRECEDENCE
        .iter()
        .map(|source| GlutenRule {
            source: *source,
            pattern: compile(gluten_pattern(*source)),
        })
        .collect()
});

pub static DAIRY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"\b(leche|milk|lactosa|lactose|queso|cheese|mantequilla|butter|crema|cream|suero|whey)\b|casein(a|ato|ate)?",
    )
});

pub static CROSS_CONTAMINATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"puede contener|trazas|procesad[oa]s? en instalaciones|elaborad[oa]s? en (una )?planta que (tambien )?procesa|may contain|\btraces\b|processed in a facility",
    )
});

pub static CLAIM_RULES: Lazy<Vec<(PositiveClaim, Regex)>> = Lazy::new(|| {
    PositiveClaim::ORDER
        .iter()
        .map(|claim| (*claim, compile(claim_pattern(*claim))))
        .collect()
});

pub static QUALITY_RULES: Lazy<Vec<(QualityFlag, Regex)>> = Lazy::new(|| {
    QualityFlag::ORDER
        .iter()
        .map(|flag| (*flag, compile(quality_pattern(*flag))))
        .collect()
});

fn gluten_pattern(source: GlutenSource) -> &'static str {
    match source {
        GlutenSource::Wheat => r"\b(trigo|wheat)\b",
        GlutenSource::BarleyMalt => r"\b(cebada|barley|malta|malt|malted|maltead[oa]s?)\b",
        GlutenSource::Rye => r"\b(centeno|rye)\b",
        GlutenSource::Oats => r"\b(avena|oats?)\b",
        GlutenSource::SoySauce => {
            r"salsa de soya|salsa de soja|soy sauce|\bsoja\b.*\btrigo\b|\bsoy\b.*\bwheat\b|\bwheat\b.*\bsoy\b"
        }
        GlutenSource::BrewersYeast => r"levadura de cerveza|brewer['’]?s yeast",
    }
}

fn claim_pattern(claim: PositiveClaim) -> &'static str {
    match claim {
        PositiveClaim::GlutenFree => r"sin gluten|gluten[ -]?free|libre de gluten|sin tacc",
        PositiveClaim::LactoseFree => r"sin lactosa|lactose[ -]?free|libre de lactosa|deslactosad[oa]",
        PositiveClaim::Fiber => r"\b(fibra|integral(es)?|whole ?grains?|fiber|fibre)\b",
        PositiveClaim::Protein => r"\b(proteinas?|proteins?)\b",
    }
}

fn quality_pattern(flag: QualityFlag) -> &'static str {
    match flag {
        QualityFlag::AddedSugar => {
            r"\b(azucar(es)?|sugars?|sucrose|sacarosa|glucose|glucosa|dextrose|dextrosa|fructose|fructosa|jarabe|syrup|sirup|hfcs)\b"
        }
        QualityFlag::Sodium => r"\b(sodio|sal|salt|sodium)\b",
        QualityFlag::Artificial => {
            r"\b(colorantes?|color(ing)?|artificial(es)?|preservatives?|conservador(es)?|conservantes?)\b"
        }
        QualityFlag::SeedOils => {
            r"\b(aceite de (soya|soja|girasol|maiz|canola)|(soy|soybean|sunflower|corn|canola) oil)\b"
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid label rule regex")
}
