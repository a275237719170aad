use serde::{Deserialize, Serialize};

use crate::domain::{RecordId, StudentId, SubjectId};

/// One averages row: a student's three scores for a subject.
///
/// Serializes with the backend's field names (`idPromedio`, `idEstudiante`,
/// `nota1`, ...). Deserialization also accepts the camelCase English names
/// (`id`, `studentId`, `score1`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        default,
        rename = "idPromedio",
        alias = "id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(rename = "idEstudiante", alias = "studentId")]
    pub student_id: StudentId,
    #[serde(rename = "idMateria", alias = "subjectId")]
    pub subject_id: SubjectId,
    #[serde(rename = "nota1", alias = "score1")]
    pub score1: f64,
    #[serde(rename = "nota2", alias = "score2")]
    pub score2: f64,
    #[serde(rename = "nota3", alias = "score3")]
    pub score3: f64,
    /// Computed server-side; never required on input.
    #[serde(
        default,
        rename = "promedio",
        alias = "average",
        skip_serializing_if = "Option::is_none"
    )]
    pub average: Option<f64>,
    #[serde(
        default,
        rename = "nombreEstudiante",
        alias = "studentName",
        skip_serializing_if = "Option::is_none"
    )]
    pub student_name: Option<String>,
    #[serde(
        default,
        rename = "nombreMateria",
        alias = "subjectName",
        skip_serializing_if = "Option::is_none"
    )]
    pub subject_name: Option<String>,
}

impl Record {
    /// The blank draft: zeroed ids and scores, never persisted.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn new(student_id: StudentId, subject_id: SubjectId, scores: [f64; 3]) -> Self {
        let [score1, score2, score3] = scores;
        Self {
            student_id,
            subject_id,
            score1,
            score2,
            score3,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some_and(RecordId::is_assigned)
    }

    pub fn scores(&self) -> [f64; 3] {
        [self.score1, self.score2, self.score3]
    }

    pub fn set_scores(&mut self, scores: [f64; 3]) {
        [self.score1, self.score2, self.score3] = scores;
    }

    pub fn mean_score(&self) -> f64 {
        (self.score1 + self.score2 + self.score3) / 3.0
    }

    /// Backend-provided average when present, otherwise the local mean.
    pub fn display_average(&self) -> f64 {
        self.average.unwrap_or_else(|| self.mean_score())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Create,
    Update,
    Remove,
}

/// Whatever the backend sent back for a write. The contract leaves it
/// unspecified, so it is kept but not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WritePayload {
    Empty,
    Json(serde_json::Value),
    Text(String),
}

impl WritePayload {
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub operation: WriteOperation,
    pub status: u16,
    pub payload: WritePayload,
}
