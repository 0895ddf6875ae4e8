use serde::Serialize;

use crate::models::{
    ClassificationResult, GlutenSource, PositiveClaim, QualityFlag, MAX_SCORE, MIN_SCORE,
};
use crate::normalize::{is_blank, normalize_label_text};
use crate::rules::{
    BASE_SCORE, CLAIM_RULES, CROSS_CONTAMINATION_CON, CROSS_CONTAMINATION_PATTERN,
    CROSS_CONTAMINATION_PENALTY, DAIRY_PATTERN, GLUTEN_CON, GLUTEN_PENALTY, GLUTEN_RULES,
    LACTOSE_CON, LACTOSE_PENALTY, QUALITY_RULES,
};
use crate::summary::{compose_summary, SummaryFacts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorePenalty {
    pub reason: &'static str,
    pub points: i32,
}

/// Which rules fired for a single classification, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchTrace {
    pub normalized_text: String,
    pub gluten_sources: Vec<GlutenSource>,
    pub dairy: bool,
    pub cross_contamination: bool,
    pub claims: Vec<PositiveClaim>,
    pub quality_flags: Vec<QualityFlag>,
    pub penalties: Vec<ScorePenalty>,
}

pub fn classify(raw: &str) -> ClassificationResult {
    classify_with_trace(raw).0
}

pub fn classify_with_trace(raw: &str) -> (ClassificationResult, MatchTrace) {
    let text = normalize_label_text(raw);

    // An allergen word counts wherever it appears, advisory clauses included.
    let gluten_sources = GLUTEN_RULES
        .iter()
        .filter(|rule| rule.pattern.is_match(&text))
        .map(|rule| rule.source)
        .collect::<Vec<_>>();
    let has_gluten = !gluten_sources.is_empty();
    let gluten_origin = gluten_sources
        .first()
        .map(|source| source.origin_label().to_string());

    let has_lactose = DAIRY_PATTERN.is_match(&text);
    let cross_contam = CROSS_CONTAMINATION_PATTERN.is_match(&text);

    let claims = CLAIM_RULES
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(claim, _)| *claim)
        .collect::<Vec<_>>();
    let quality_flags = QUALITY_RULES
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(flag, _)| *flag)
        .collect::<Vec<_>>();

    let mut pros = Vec::new();
    for claim in &claims {
        push_unique(&mut pros, claim.label());
    }

    let mut cons = Vec::new();
    let mut penalties = Vec::new();
    for flag in &quality_flags {
        push_unique(&mut cons, flag.label());
        penalties.push(ScorePenalty {
            reason: flag.label(),
            points: flag.penalty(),
        });
    }
    if has_gluten {
        push_unique(&mut cons, GLUTEN_CON);
        penalties.push(ScorePenalty {
            reason: GLUTEN_CON,
            points: GLUTEN_PENALTY,
        });
    }
    if has_lactose {
        push_unique(&mut cons, LACTOSE_CON);
        penalties.push(ScorePenalty {
            reason: LACTOSE_CON,
            points: LACTOSE_PENALTY,
        });
    }
    if cross_contam && !has_gluten {
        push_unique(&mut cons, CROSS_CONTAMINATION_CON);
        penalties.push(ScorePenalty {
            reason: CROSS_CONTAMINATION_CON,
            points: CROSS_CONTAMINATION_PENALTY,
        });
    }

    let raw_score = BASE_SCORE - penalties.iter().map(|penalty| penalty.points).sum::<i32>();

    let summary = compose_summary(&SummaryFacts {
        blank_input: is_blank(&text),
        has_gluten,
        gluten_origin: gluten_origin.as_deref(),
        has_lactose,
        cross_contam,
    });

    let result = ClassificationResult {
        has_gluten,
        gluten_origin,
        has_lactose,
        cross_contam,
        pros,
        cons,
        score: clamp_score(i64::from(raw_score)),
        summary,
    };

    let trace = MatchTrace {
        normalized_text: text,
        gluten_sources,
        dairy: has_lactose,
        cross_contamination: cross_contam,
        claims,
        quality_flags,
        penalties,
    };

    (result, trace)
}

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}

fn push_unique(entries: &mut Vec<String>, label: &str) {
    if !entries.iter().any(|entry| entry == label) {
        entries.push(label.to_string());
    }
}
