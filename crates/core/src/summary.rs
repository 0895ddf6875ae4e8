pub const EMPTY_INPUT_SUMMARY: &str = "Escaneá un producto o pegá el texto de la etiqueta";
pub const UNSPECIFIED_ORIGIN: &str = "no especificado";

const CROSS_CONTAMINATION_SUMMARY: &str =
    "No se detectó gluten en ingredientes, pero hay riesgo de contaminación cruzada.";
const NO_GLUTEN_SUMMARY: &str = "No se detectó gluten en la lista de ingredientes.";
const LACTOSE_CLAUSE: &str = " También presenta lactosa o derivados lácteos.";

pub struct SummaryFacts<'a> {
    pub blank_input: bool,
    pub has_gluten: bool,
    pub gluten_origin: Option<&'a str>,
    pub has_lactose: bool,
    pub cross_contam: bool,
}

pub fn compose_summary(facts: &SummaryFacts<'_>) -> String {
    if facts.blank_input {
        return EMPTY_INPUT_SUMMARY.to_string();
    }

    let mut summary = if facts.has_gluten {
        format!(
            "Este producto CONTIENE gluten (origen: {}).",
            facts.gluten_origin.unwrap_or(UNSPECIFIED_ORIGIN)
        )
    } else if facts.cross_contam {
        CROSS_CONTAMINATION_SUMMARY.to_string()
    } else {
        NO_GLUTEN_SUMMARY.to_string()
    };

    if facts.has_lactose {
        summary.push_str(LACTOSE_CLAUSE);
    }

    summary
}
