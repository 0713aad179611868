use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub cover_url: Option<String>,
    pub certificate_config: CertificateConfig,
    pub modules: Vec<Module>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Coordinator override: every lesson of a locked module stays locked.
    pub is_locked: bool,
    /// Inactive modules are hidden from students and excluded from progress.
    pub is_active: bool,
    pub lessons: Vec<Lesson>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_id: String,
    pub duration: String,
    pub content: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub quiz: Quiz,
    pub is_active: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Link,
    Video,
    Pdf,
    Image,
    Doc,
    Ppt,
    Txt,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: String,
    pub question: String,
    pub options: Vec<QuizOption>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// Template fields handed verbatim to the certificate renderer.
///
/// Stored as a JSON document; older documents use camelCase keys and may
/// omit fields, which then take their defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CertificateConfig {
    pub title: String,
    pub subtitle: String,
    #[serde(alias = "bodyText")]
    pub body_text: String,
    #[serde(alias = "signerName")]
    pub signer_name: String,
    #[serde(alias = "signerRole")]
    pub signer_role: String,
    #[serde(alias = "institutionName")]
    pub institution_name: String,
    #[serde(alias = "primaryColor")]
    pub primary_color: String,
    #[serde(alias = "displaySeal")]
    pub display_seal: bool,
}

/// Reasons a lesson edit is refused before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    EmptyTitle,
    TooFewOptions(usize),
    NoCorrectOption,
    MultipleCorrectOptions(usize),
    IncompleteMaterial(String),
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::EmptyTitle => write!(f, "lesson title must not be empty"),
            IntegrityViolation::TooFewOptions(n) => {
                write!(f, "quiz needs at least 2 options, got {}", n)
            }
            IntegrityViolation::NoCorrectOption => {
                write!(f, "quiz must have exactly one correct option, none is marked")
            }
            IntegrityViolation::MultipleCorrectOptions(n) => {
                write!(f, "quiz must have exactly one correct option, {} are marked", n)
            }
            IntegrityViolation::IncompleteMaterial(id) => {
                write!(f, "material '{}' is missing a title or URL", id)
            }
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        CertificateConfig {
            title: "Certificate".to_string(),
            subtitle: "of completion".to_string(),
            body_text: "This certificate is proudly presented to".to_string(),
            signer_name: String::new(),
            signer_role: String::new(),
            institution_name: String::new(),
            primary_color: "#7c3aed".to_string(),
            display_seal: true,
        }
    }
}

impl Course {
    /// The stand-in served when a course cannot be read and no earlier snapshot exists.
    pub fn empty(id: &str) -> Self {
        Course {
            id: id.to_string(),
            title: "Untitled course".to_string(),
            cover_url: None,
            certificate_config: CertificateConfig::default(),
            modules: Vec::new(),
        }
    }

    pub fn module_index(&self, module_id: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.id == module_id)
    }

    /// Finds a lesson anywhere in the tree, returning its (module, lesson) indices.
    pub fn locate_lesson(&self, lesson_id: &str) -> Option<(usize, usize)> {
        self.modules.iter().enumerate().find_map(|(m_idx, module)| {
            module
                .lessons
                .iter()
                .position(|l| l.id == lesson_id)
                .map(|l_idx| (m_idx, l_idx))
        })
    }

    pub fn lesson_at(&self, module_index: usize, lesson_index: usize) -> Option<&Lesson> {
        self.modules
            .get(module_index)
            .and_then(|m| m.lessons.get(lesson_index))
    }

    /// Moves a module to a new slot, shifting the modules in between.
    /// Returns `false` when either index is out of range.
    pub fn move_module(&mut self, from: usize, to: usize) -> bool {
        move_item(&mut self.modules, from, to)
    }
}

impl Module {
    pub fn move_lesson(&mut self, from: usize, to: usize) -> bool {
        move_item(&mut self.lessons, from, to)
    }
}

impl Lesson {
    /// Checks everything the editor must refuse to save.
    pub fn validate(&self) -> Result<(), Vec<IntegrityViolation>> {
        let mut violations = Vec::new();

        if self.title.trim().is_empty() {
            violations.push(IntegrityViolation::EmptyTitle);
        }

        let options = self.quiz.options.len();
        if options < 2 {
            violations.push(IntegrityViolation::TooFewOptions(options));
        }

        match self.quiz.correct_count() {
            0 => violations.push(IntegrityViolation::NoCorrectOption),
            1 => {}
            n => violations.push(IntegrityViolation::MultipleCorrectOptions(n)),
        }

        for material in &self.materials {
            if material.title.trim().is_empty() || material.url.trim().is_empty() {
                violations.push(IntegrityViolation::IncompleteMaterial(material.id.clone()));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl Quiz {
    /// First option marked correct. Legacy rows may carry several; the first wins.
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }

    /// Marks `option_id` as the only correct option. Returns `false` if no such option.
    pub fn mark_correct(&mut self, option_id: &str) -> bool {
        if !self.options.iter().any(|o| o.id == option_id) {
            return false;
        }
        for option in &mut self.options {
            option.is_correct = option.id == option_id;
        }
        true
    }
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Link => "link",
            MaterialKind::Video => "video",
            MaterialKind::Pdf => "pdf",
            MaterialKind::Image => "image",
            MaterialKind::Doc => "doc",
            MaterialKind::Ppt => "ppt",
            MaterialKind::Txt => "txt",
        }
    }

    /// Lenient parse for stored values; anything unrecognised reads as a plain link.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for MaterialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "link" => Ok(MaterialKind::Link),
            "video" => Ok(MaterialKind::Video),
            "pdf" => Ok(MaterialKind::Pdf),
            "image" => Ok(MaterialKind::Image),
            "doc" => Ok(MaterialKind::Doc),
            "ppt" => Ok(MaterialKind::Ppt),
            "txt" => Ok(MaterialKind::Txt),
            other => Err(format!("unknown material type '{}'", other)),
        }
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}
