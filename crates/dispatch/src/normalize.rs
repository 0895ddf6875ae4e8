use labelscan_core::rules::{CROSS_CONTAMINATION_CON, GLUTEN_CON};
use labelscan_core::summary::UNSPECIFIED_ORIGIN;
use labelscan_core::{clamp_score, normalize_label_text, ClassificationResult};
use labelscan_provider::ProviderReply;
use serde_json::Value;

pub const DEFAULT_PROVIDER_SCORE: u8 = 5;
pub const DEFAULT_PROVIDER_SUMMARY: &str = "Análisis generado.";

/// Materializes an untyped provider reply into a `ClassificationResult`,
/// field by field. Nothing in the reply is trusted.
pub fn normalize_provider_reply(reply: &ProviderReply) -> ClassificationResult {
    let has_gluten = bool_field(reply, "hasGluten");

    let stated_origin = reply
        .get("glutenOrigin")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);
    let gluten_origin = if has_gluten {
        Some(stated_origin.unwrap_or_else(|| UNSPECIFIED_ORIGIN.to_string()))
    } else {
        None
    };

    let score = reply
        .get("score")
        .and_then(Value::as_f64)
        .map(|value| clamp_score(value.round() as i64))
        .unwrap_or(DEFAULT_PROVIDER_SCORE);

    let summary = reply
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_PROVIDER_SUMMARY)
        .to_string();

    let cross_contam = bool_field(reply, "crossContam");
    let cons = reconcile_cons(string_list(reply, "cons"), has_gluten, cross_contam);

    ClassificationResult {
        has_gluten,
        gluten_origin,
        has_lactose: bool_field(reply, "hasLactose"),
        cross_contam,
        pros: string_list(reply, "pros"),
        cons,
        score,
        summary,
    }
}

/// Holds provider cons to the same gluten rules as heuristic results: a gluten
/// entry whenever gluten is present, and the cross-contamination entry only
/// for an advisory without gluten.
fn reconcile_cons(mut cons: Vec<String>, has_gluten: bool, cross_contam: bool) -> Vec<String> {
    let cross_contamination = normalize_label_text(CROSS_CONTAMINATION_CON);
    if has_gluten || !cross_contam {
        cons.retain(|con| normalize_label_text(con) != cross_contamination);
    }
    if has_gluten && !cons.iter().any(|con| normalize_label_text(con).contains("gluten")) {
        cons.push(GLUTEN_CON.to_string());
    }
    cons
}

fn bool_field(reply: &ProviderReply, key: &str) -> bool {
    reply.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(reply: &ProviderReply, key: &str) -> Vec<String> {
    let Some(items) = reply.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items.iter().filter_map(Value::as_str).map(str::trim) {
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}
