use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub has_gluten: bool,
    pub gluten_origin: Option<String>,
    pub has_lactose: bool,
    pub cross_contam: bool,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub score: u8,
    pub summary: String,
}

/// Opaque photo payload (base64 JPEG). Only the external provider ever looks inside.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn from_base64(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageRef({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "imageBase64")]
    pub image: Option<ImageRef>,
}

impl ScanRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn from_image(image: ImageRef) -> Self {
        Self {
            text: None,
            image: Some(image),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|value| !value.is_empty())
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref().filter(|image| !image.is_empty())
    }

    /// Text the heuristic path falls back to; image-only requests degrade to "".
    pub fn fallback_text(&self) -> &str {
        self.text().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlutenSource {
    Wheat,
    BarleyMalt,
    Rye,
    Oats,
    SoySauce,
    BrewersYeast,
}

impl GlutenSource {
    /// Precedence order used to pick `glutenOrigin` when several sources match.
    pub const PRECEDENCE: [GlutenSource; 6] = [
        Self::Wheat,
        Self::BarleyMalt,
        Self::Rye,
        Self::Oats,
        Self::SoySauce,
        Self::BrewersYeast,
    ];

    pub fn origin_label(self) -> &'static str {
        match self {
            Self::Wheat => "trigo/wheat",
            Self::BarleyMalt => "cebada/barley",
            Self::Rye => "centeno/rye",
            Self::Oats => "avena/oats",
            Self::SoySauce => "salsa de soya/soy sauce",
            Self::BrewersYeast => "levadura de cerveza/brewer's yeast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositiveClaim {
    GlutenFree,
    LactoseFree,
    Fiber,
    Protein,
}

impl PositiveClaim {
    pub const ORDER: [PositiveClaim; 4] = [
        Self::GlutenFree,
        Self::LactoseFree,
        Self::Fiber,
        Self::Protein,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::GlutenFree => "Declarado sin gluten",
            Self::LactoseFree => "Declarado sin lactosa",
            Self::Fiber => "Fuente de fibra/integral",
            Self::Protein => "Aporte de proteína",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    AddedSugar,
    Sodium,
    Artificial,
    SeedOils,
}

impl QualityFlag {
    pub const ORDER: [QualityFlag; 4] = [
        Self::AddedSugar,
        Self::Sodium,
        Self::Artificial,
        Self::SeedOils,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AddedSugar => "Azúcares añadidos",
            Self::Sodium => "Puede ser alto en sodio",
            Self::Artificial => "Aditivos / artificiales",
            Self::SeedOils => "Aceites vegetales refinados",
        }
    }

    pub fn penalty(self) -> i32 {
        match self {
            Self::AddedSugar => 2,
            Self::Sodium | Self::Artificial | Self::SeedOils => 1,
        }
    }
}
