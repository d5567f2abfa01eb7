// Static task definitions, one per pipeline stage

use serde::Serialize;

use crate::agents::role::{AgentProfile, DOCTOR, EXERCISE_SPECIALIST, NUTRITIONIST, VERIFIER};
use crate::agents::{AgentRole, Placeholder, PromptTemplate, TemplateError, TemplateValues};
use crate::tools::{ToolId, ToolSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Verification,
    MedicalAnalysis,
    NutritionAnalysis,
    ExercisePlanning,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Verification,
        TaskKind::MedicalAnalysis,
        TaskKind::NutritionAnalysis,
        TaskKind::ExercisePlanning,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TaskKind::Verification => "verification",
            TaskKind::MedicalAnalysis => "medical_analysis",
            TaskKind::NutritionAnalysis => "nutrition_analysis",
            TaskKind::ExercisePlanning => "exercise_planning",
        }
    }

    pub fn definition(self) -> &'static TaskDefinition {
        match self {
            TaskKind::Verification => &VERIFICATION,
            TaskKind::MedicalAnalysis => &MEDICAL_ANALYSIS,
            TaskKind::NutritionAnalysis => &NUTRITION_ANALYSIS,
            TaskKind::ExercisePlanning => &EXERCISE_PLANNING,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct TaskDefinition {
    pub kind: TaskKind,
    pub agent: AgentRole,
    /// May reference `{query}` and `{file_path}`.
    pub description: &'static str,
    /// Guidance for the agent, not validated against the output.
    pub expected_output: &'static str,
    pub tools: ToolSet,
    pub async_execution: bool,
}

pub const VERIFICATION: TaskDefinition = TaskDefinition {
    kind: TaskKind::Verification,
    agent: AgentRole::Verifier,
    description: "Validate the uploaded document stored at {file_path} to ensure it's a legitimate blood test report\n\
        1. Verify the document contains appropriate medical formatting\n\
        2. Check for required laboratory information and reference ranges\n\
        3. Ensure the report includes necessary patient and lab identifiers\n\
        4. Flag any inconsistencies or missing critical information",
    expected_output: "Document validation report including:\n\
        - Confirmation of document type and legitimacy\n\
        - Assessment of report completeness and formatting\n\
        - Identification of any missing critical information\n\
        - Recommendations for proceeding with analysis or requesting additional documentation",
    tools: ToolSet::of(&[ToolId::BloodTestReader]),
    async_execution: false,
};

pub const MEDICAL_ANALYSIS: TaskDefinition = TaskDefinition {
    kind: TaskKind::MedicalAnalysis,
    agent: AgentRole::Doctor,
    description: "Analyze the uploaded blood test report ({file_path}) to address the user's query: {query}\n\
        1. Read and interpret the blood test results thoroughly\n\
        2. Identify any abnormal values and their clinical significance\n\
        3. Provide clear, evidence-based explanations of findings\n\
        4. Offer appropriate medical insights while emphasizing the need for professional medical consultation\n\
        5. Use reliable medical sources and current clinical guidelines",
    expected_output: "A comprehensive blood test analysis report including:\n\
        - Summary of key findings from the blood work\n\
        - Explanation of any abnormal values and their potential clinical significance\n\
        - Professional medical insights based on current evidence\n\
        - Clear recommendations for follow-up with healthcare providers\n\
        - Emphasis that this analysis is for educational purposes and not a substitute for professional medical advice",
    tools: ToolSet::of(&[ToolId::BloodTestReader]),
    async_execution: false,
};

pub const NUTRITION_ANALYSIS: TaskDefinition = TaskDefinition {
    kind: TaskKind::NutritionAnalysis,
    agent: AgentRole::Nutritionist,
    description: "Based on the blood test results, provide evidence-based nutritional recommendations for: {query}\n\
        1. Analyze blood markers relevant to nutritional status\n\
        2. Identify any nutrient deficiencies or imbalances\n\
        3. Recommend appropriate dietary modifications\n\
        4. Suggest meal planning strategies\n\
        5. Only recommend supplements if clearly indicated by blood work",
    expected_output: "A detailed nutrition plan including:\n\
        - Analysis of nutrition-related blood markers\n\
        - Specific dietary recommendations based on blood work findings\n\
        - Meal planning suggestions and food choices\n\
        - Supplement recommendations only if clinically indicated\n\
        - Timeline for dietary implementation and follow-up testing recommendations",
    tools: ToolSet::of(&[ToolId::BloodTestReader, ToolId::NutritionAnalyzer]),
    async_execution: false,
};

pub const EXERCISE_PLANNING: TaskDefinition = TaskDefinition {
    kind: TaskKind::ExercisePlanning,
    agent: AgentRole::ExerciseSpecialist,
    description: "Create a safe, personalized exercise plan based on blood test results for: {query}\n\
        1. Review blood work for any exercise contraindications\n\
        2. Assess cardiovascular and metabolic markers\n\
        3. Design appropriate exercise intensity and duration\n\
        4. Include safety considerations and monitoring guidelines\n\
        5. Provide progressive exercise recommendations",
    expected_output: "A comprehensive exercise plan including:\n\
        - Safety assessment based on blood work findings\n\
        - Specific exercise recommendations (type, intensity, duration, frequency)\n\
        - Progressive training plan with clear milestones\n\
        - Monitoring guidelines and warning signs to watch for\n\
        - Recommendations for medical clearance if needed",
    tools: ToolSet::of(&[ToolId::BloodTestReader, ToolId::ExercisePlanner]),
    async_execution: false,
};

const fn task_fits(task: &TaskDefinition, agent: &AgentProfile) -> bool {
    !task.tools.is_empty()
        && task.tools.is_subset_of(agent.tools)
        && (task.agent as u8) == (agent.role as u8)
        && !task.async_execution
}

// Every task's tools must come from its agent's capability set.
const _: () = {
    assert!(task_fits(&VERIFICATION, &VERIFIER));
    assert!(task_fits(&MEDICAL_ANALYSIS, &DOCTOR));
    assert!(task_fits(&NUTRITION_ANALYSIS, &NUTRITIONIST));
    assert!(task_fits(&EXERCISE_PLANNING, &EXERCISE_SPECIALIST));
};

/// A task definition with its description template compiled.
#[derive(Debug)]
pub struct TaskSpec {
    pub definition: &'static TaskDefinition,
    description: PromptTemplate,
}

impl TaskSpec {
    pub fn compile(definition: &'static TaskDefinition) -> Result<Self, TemplateError> {
        let description = PromptTemplate::parse(
            definition.description,
            &[Placeholder::Query, Placeholder::FilePath],
        )?;
        Ok(Self {
            definition,
            description,
        })
    }

    pub fn kind(&self) -> TaskKind {
        self.definition.kind
    }

    pub fn agent(&self) -> AgentRole {
        self.definition.agent
    }

    pub fn describe(&self, values: &TemplateValues<'_>) -> String {
        self.description.render(values)
    }
}

/// All compiled tasks, built once at startup.
#[derive(Debug)]
pub struct TaskBook {
    specs: Vec<TaskSpec>,
}

impl TaskBook {
    pub fn new() -> Result<Self, TemplateError> {
        let specs = TaskKind::ALL
            .into_iter()
            .map(|kind| TaskSpec::compile(kind.definition()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { specs })
    }

    pub fn get(&self, kind: TaskKind) -> &TaskSpec {
        // specs are built from TaskKind::ALL in order
        &self.specs[kind as usize]
    }
}
