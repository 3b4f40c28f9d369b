use rand::prelude::*;

pub const DEFAULT_IDEA_COUNT: usize = 5;

const THEMES: &[&str] = &[
    "Birthday",
    "Thank You",
    "Wedding",
    "Anniversary",
    "Sympathy",
    "Graduation",
    "New Baby",
    "Holiday",
];

const TECHNIQUES: &[&str] = &[
    "Watercolor",
    "Embossing",
    "Die-cutting",
    "Stamping",
    "Quilling",
    "Pop-up",
    "Interactive",
];

const STYLES: &[&str] = &[
    "Vintage",
    "Modern",
    "Minimalist",
    "Whimsical",
    "Elegant",
    "Rustic",
    "Shabby Chic",
];

const PALETTES: &[&str] = &["warm", "cool", "pastel", "bold", "monochromatic"];

const FINISHING_TIPS: &[&str] = &[
    "Add some hand-lettered sentiments for a personal touch.",
    "Incorporate some die-cut elements for dimension.",
    "Use patterned paper to create interesting layers.",
    "Add some bling with rhinestones or sequins.",
    "Try a unique fold for added interest.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdea {
    pub theme: &'static str,
    pub technique: &'static str,
    pub style: &'static str,
    pub palette: &'static str,
    pub tip: &'static str,
}

impl CardIdea {
    pub fn render(&self) -> String {
        format!(
            "**{} Card**: Create a {} card using {} technique. Focus on {} colors. {}",
            self.theme,
            self.style.to_lowercase(),
            self.technique.to_lowercase(),
            self.palette,
            self.tip
        )
    }
}

pub struct IdeaGenerator {
    rng: StdRng,
}

impl IdeaGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_idea(&mut self) -> CardIdea {
        CardIdea {
            theme: pick(&mut self.rng, THEMES),
            technique: pick(&mut self.rng, TECHNIQUES),
            style: pick(&mut self.rng, STYLES),
            palette: pick(&mut self.rng, PALETTES),
            tip: pick(&mut self.rng, FINISHING_TIPS),
        }
    }

    pub fn ideas(&mut self, count: usize) -> Vec<CardIdea> {
        (0..count).map(|_| self.next_idea()).collect()
    }
}

fn pick(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}
