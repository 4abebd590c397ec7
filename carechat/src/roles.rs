use carechat_common::transcript::{Speaker, ANALYZER, PATIENT, RECOMMENDER};

const PATIENT_INSTRUCTIONS: &str = "You describe your emotions and mental health concerns.";

const ANALYZER_INSTRUCTIONS: &str = "You analyze the user's emotions based on their input. \
Do not provide treatment or self-care advice. \
Instead, just summarize the dominant emotions they may be experiencing.";

const RECOMMENDER_INSTRUCTIONS: &str = "You suggest relaxation techniques and self-care methods \
only based on the analysis from the Emotion Analysis Agent. \
Do not analyze emotions, just give recommendations based on the prior response.";

/// A scripted participant: a name plus the system prompt it speaks under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub instructions: String,
}

impl Role {
    pub fn new(name: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            instructions: instructions.to_string(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        Speaker::from_label(&self.name)
    }
}

/// The three fixed roles, built once at start-up and shared read-only.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    pub patient: Role,
    pub analyzer: Role,
    pub recommender: Role,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self {
            patient: Role::new(PATIENT, PATIENT_INSTRUCTIONS),
            analyzer: Role::new(ANALYZER, ANALYZER_INSTRUCTIONS),
            recommender: Role::new(RECOMMENDER, RECOMMENDER_INSTRUCTIONS),
        }
    }
}

impl RoleRegistry {
    /// Speaking order after the opener.
    pub fn responders(&self) -> [&Role; 2] {
        [&self.analyzer, &self.recommender]
    }
}
