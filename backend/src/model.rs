use image::GenericImageView;
use rand::Rng;

/// Canned classes served while no trained model is wired in.
struct DiseaseClass {
    label: &'static str,
    treatments: &'static [&'static str],
}

const CLASSES: &[DiseaseClass] = &[
    DiseaseClass {
        label: "Healthy",
        treatments: &["No treatment needed."],
    },
    DiseaseClass {
        label: "Powdery",
        treatments: &[
            "Apply fungicides with sulfur or potassium bicarbonate",
            "Ensure proper air circulation around plants",
            "Remove and dispose of infected plant parts",
            "Use neem oil as a natural alternative",
            "Maintain proper plant spacing to reduce humidity",
        ],
    },
    DiseaseClass {
        label: "Rust",
        treatments: &[
            "Apply fungicides containing tebuconazole or chlorothalonil",
            "Remove and destroy infected plant material",
            "Improve air circulation by proper spacing",
            "Avoid overhead irrigation to keep foliage dry",
            "Rotate crops to break disease cycle",
        ],
    },
];

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("{0}")]
    Preprocessing(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    pub treatments: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Model;

impl Model {
    pub fn new() -> Self {
        Self
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        CLASSES.iter().map(|class| class.label)
    }

    pub fn inference(&self, image: &[u8]) -> Result<Prediction, InferenceError> {
        let decoded = image::load_from_memory(image)?;
        let (width, height) = decoded.dimensions();
        log::info!("Image successfully read: {}x{}, {:?}", width, height, decoded.color());

        let mut rng = rand::rng();
        let class = &CLASSES[rng.random_range(0..CLASSES.len())];
        let confidence = (rng.random_range(0.70..=0.98_f64) * 100.0).round() / 100.0;

        Ok(Prediction {
            label: class.label.to_string(),
            confidence,
            treatments: class.treatments.iter().map(|t| t.to_string()).collect(),
        })
    }
}
