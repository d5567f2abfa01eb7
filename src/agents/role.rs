// Agent roles and their static profiles

use serde::Serialize;

use crate::tools::{ToolId, ToolSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Verifier,
    Doctor,
    Nutritionist,
    ExerciseSpecialist,
}

impl AgentRole {
    /// Listing order used by the health endpoint.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Doctor,
        AgentRole::Nutritionist,
        AgentRole::ExerciseSpecialist,
        AgentRole::Verifier,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            AgentRole::Verifier => "verifier",
            AgentRole::Doctor => "doctor",
            AgentRole::Nutritionist => "nutritionist",
            AgentRole::ExerciseSpecialist => "exercise_specialist",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    pub fn profile(self) -> &'static AgentProfile {
        match self {
            AgentRole::Verifier => &VERIFIER,
            AgentRole::Doctor => &DOCTOR,
            AgentRole::Nutritionist => &NUTRITIONIST,
            AgentRole::ExerciseSpecialist => &EXERCISE_SPECIALIST,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            AgentRole::Verifier => 0,
            AgentRole::Doctor => 1,
            AgentRole::Nutritionist => 2,
            AgentRole::ExerciseSpecialist => 3,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Static configuration for one role. Built at compile time, shared
/// read-only by every run.
#[derive(Debug)]
pub struct AgentProfile {
    pub role: AgentRole,
    pub title: &'static str,
    /// May reference `{query}`.
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: ToolSet,
    pub max_iter: u32,
    pub max_rpm: u32,
    pub allow_delegation: bool,
}

pub const VERIFIER: AgentProfile = AgentProfile {
    role: AgentRole::Verifier,
    title: "Medical Report Validator",
    goal: "Verify the authenticity and completeness of blood test reports before medical analysis.",
    backstory: "You are a certified medical records specialist with expertise in validating laboratory reports. \
        You ensure uploaded documents are legitimate blood test reports with proper formatting, \
        required medical information, and appropriate laboratory standards. You flag any inconsistencies \
        or missing critical information that could affect medical interpretation.",
    tools: ToolSet::of(&[ToolId::BloodTestReader]),
    max_iter: 2,
    max_rpm: 10,
    allow_delegation: false,
};

pub const DOCTOR: AgentProfile = AgentProfile {
    role: AgentRole::Doctor,
    title: "Senior Medical Doctor",
    goal: "Analyze blood test reports professionally and provide accurate, evidence-based medical insights for: {query}",
    backstory: "You are a board-certified physician with 20 years of experience in laboratory medicine and diagnostics. \
        You specialize in interpreting blood test results with precision and providing clear, actionable medical advice. \
        You always prioritize patient safety and base recommendations on current medical evidence and guidelines. \
        You explain complex medical concepts in terms patients can understand while maintaining clinical accuracy.",
    tools: ToolSet::of(&[ToolId::BloodTestReader, ToolId::WebSearch]),
    max_iter: 3,
    max_rpm: 10,
    allow_delegation: true,
};

pub const NUTRITIONIST: AgentProfile = AgentProfile {
    role: AgentRole::Nutritionist,
    title: "Registered Dietitian",
    goal: "Provide evidence-based nutritional recommendations based on blood test analysis for: {query}",
    backstory: "You are a registered dietitian nutritionist with 15 years of clinical experience. \
        You specialize in medical nutrition therapy and interpreting laboratory values to create \
        personalized dietary interventions. You focus on whole food approaches and only recommend \
        supplements when clinically indicated by blood work results.",
    tools: ToolSet::of(&[ToolId::BloodTestReader, ToolId::NutritionAnalyzer, ToolId::WebSearch]),
    max_iter: 3,
    max_rpm: 10,
    allow_delegation: false,
};

pub const EXERCISE_SPECIALIST: AgentProfile = AgentProfile {
    role: AgentRole::ExerciseSpecialist,
    title: "Clinical Exercise Physiologist",
    goal: "Design safe, effective exercise recommendations based on blood test results for: {query}",
    backstory: "You are a certified clinical exercise physiologist with expertise in exercise prescription \
        for individuals with medical conditions. You interpret blood work to identify any limitations \
        or special considerations for exercise programming. You prioritize safety while maximizing \
        the therapeutic benefits of physical activity.",
    tools: ToolSet::of(&[ToolId::BloodTestReader, ToolId::ExercisePlanner, ToolId::WebSearch]),
    max_iter: 3,
    max_rpm: 10,
    allow_delegation: false,
};

const fn check_profile(profile: &AgentProfile) -> bool {
    !profile.tools.is_empty() && profile.max_iter >= 1 && profile.max_rpm >= 1
}

const _: () = {
    assert!(check_profile(&VERIFIER));
    assert!(check_profile(&DOCTOR));
    assert!(check_profile(&NUTRITIONIST));
    assert!(check_profile(&EXERCISE_SPECIALIST));
};
