use super::templates::{render, template_for};
use super::{IntentKind, PromptIntent};
use crate::error::BuildError;
use crate::shape::{Field, ResponseShape};

/// A rendered prompt ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    intent: PromptIntent,
    prompt: String,
    shape: Option<ResponseShape>,
}

impl QueryRequest {
    pub fn intent(&self) -> &PromptIntent {
        &self.intent
    }

    pub fn kind(&self) -> IntentKind {
        self.intent.kind()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn shape(&self) -> Option<&ResponseShape> {
        self.shape.as_ref()
    }
}

/// Render an intent into a prompt plus its response shape.
///
/// Pure: the same intent always yields the same request. Fails before
/// anything is sent when a template placeholder has no (or a blank) value.
pub fn build(intent: PromptIntent) -> Result<QueryRequest, BuildError> {
    let kind = intent.kind();
    let prompt = render(kind, template_for(kind), intent.params())?;
    Ok(QueryRequest {
        intent,
        prompt,
        shape: shape_for(kind),
    })
}

/// Response shape expected for an intent. `None` means free text.
pub fn shape_for(kind: IntentKind) -> Option<ResponseShape> {
    match kind {
        IntentKind::AnalyzeTopic => Some(ResponseShape::object(vec![
            Field::string("sentiment")
                .described("El sentimiento general: Positivo, Negativo o Neutral."),
            Field::string_list("keyThemes").described("Lista de temas clave."),
            Field::string("executiveSummary").described("Un resumen ejecutivo del análisis."),
        ])),
        IntentKind::GenerateHeadlines => Some(ResponseShape::list_of(
            ResponseShape::string_object(&["title", "source", "summary"]),
        )),
        IntentKind::GetGeopoliticalAnalysis => Some(ResponseShape::object(vec![
            Field::string("summary"),
            Field::string_list("keyPoints"),
            Field::string("riskAssessment"),
        ])),
        IntentKind::SimulateChannelFeed => Some(ResponseShape::list_of(
            ResponseShape::string_object(&["channel", "author", "text", "timestamp"]),
        )),
        IntentKind::GenerateContent | IntentKind::SimulateTranscript => None,
    }
}
