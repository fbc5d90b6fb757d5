//! Prompt templates and the placeholder renderer.
//!
//! Placeholders are `{name}` with `name` made of lowercase ASCII letters,
//! digits and underscores. `{{` and `}}` render a literal brace.

use super::IntentKind;
use crate::error::BuildError;
use std::collections::BTreeMap;

const ANALYZE_TOPIC: &str = "Realiza un análisis de percepción institucional sobre \"{topic}\".
Evalúa el sentimiento general (Positivo, Negativo, Neutral), identifica los temas clave discutidos en los medios y genera un resumen ejecutivo.
El sentimiento debe ser una única palabra. Los temas clave deben ser una lista de viñetas.";

const GENERATE_HEADLINES: &str = "Genera 5 titulares de noticias recientes y creíbles sobre \"{topic}\" en Venezuela. \
Cada titular debe incluir una fuente ficticia y un breve resumen de una oración.";

const GENERATE_CONTENT: &str = "Eres un experto en comunicaciones del Banco Central de Venezuela.
Basado en el tema \"{topic}\", redacta un borrador para un \"{content_type}\".
El tono debe ser formal, informativo y alineado con los objetivos institucionales.";

const GEOPOLITICAL_ANALYSIS: &str = "Analiza la siguiente noticia desde una perspectiva geopolítica, enfocándote en el impacto para Venezuela.
Noticia: \"{news_summary}\"

Proporciona un resumen del análisis, 3 puntos clave y una evaluación de riesgo (Bajo, Medio, Alto).";

const SIMULATE_CHANNEL_FEED: &str = "Simula un feed de mensajes de los siguientes canales de Telegram: {channels}.
Los temas deben centrarse en la economía de Venezuela, finanzas, y anuncios del BCV.
Genera 5 mensajes realistas. Cada mensaje debe incluir el nombre del canal, un autor ficticio, el contenido del mensaje y una marca de tiempo relativa (p. ej., \"hace 5 minutos\").";

const SIMULATE_TRANSCRIPT: &str = "Genera una transcripción ficticia pero plausible para un clip de audio de 15 segundos \
de un oficial de un banco central hablando sobre política monetaria. \
Incluye pausas y algunas dudas para que suene realista.";

pub(crate) fn template_for(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::AnalyzeTopic => ANALYZE_TOPIC,
        IntentKind::GenerateHeadlines => GENERATE_HEADLINES,
        IntentKind::GenerateContent => GENERATE_CONTENT,
        IntentKind::GetGeopoliticalAnalysis => GEOPOLITICAL_ANALYSIS,
        IntentKind::SimulateChannelFeed => SIMULATE_CHANNEL_FEED,
        IntentKind::SimulateTranscript => SIMULATE_TRANSCRIPT,
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Distinct placeholder names in order of first appearance. Malformed
/// placeholders are skipped here; `render` reports them.
pub(crate) fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'}' if bytes.get(i + 1) == Some(&b'}') => i += 2,
            b'{' => match template[i + 1..].find('}') {
                Some(off) => {
                    let name = &template[i + 1..i + 1 + off];
                    if is_placeholder_name(name) && !names.contains(&name) {
                        names.push(name);
                    }
                    i += off + 2;
                }
                None => break,
            },
            _ => i += 1,
        }
    }
    names
}

/// Fill every placeholder of `template` from `params`.
///
/// Values are inserted trimmed and are not re-scanned for placeholders.
pub(crate) fn render(
    intent: IntentKind,
    template: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, BuildError> {
    let mut out = String::with_capacity(template.len() + 64);
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push_str(&template[literal_start..i]);
                out.push('{');
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push_str(&template[literal_start..i]);
                out.push('}');
                i += 2;
                literal_start = i;
            }
            b'{' => {
                out.push_str(&template[literal_start..i]);
                let off = template[i + 1..].find('}').ok_or_else(|| BuildError::Template {
                    intent,
                    reason: format!("unterminated placeholder at byte {}", i),
                })?;
                let name = &template[i + 1..i + 1 + off];
                if !is_placeholder_name(name) {
                    return Err(BuildError::Template {
                        intent,
                        reason: format!("invalid placeholder name '{}'", name),
                    });
                }
                let value = params.get(name).ok_or_else(|| BuildError::MissingParam {
                    intent,
                    param: name.to_string(),
                })?;
                let value = value.trim();
                if value.is_empty() {
                    return Err(BuildError::BlankParam {
                        intent,
                        param: name.to_string(),
                    });
                }
                out.push_str(value);
                i += off + 2;
                literal_start = i;
            }
            b'}' => {
                return Err(BuildError::Template {
                    intent,
                    reason: format!("unmatched '}}' at byte {}", i),
                });
            }
            _ => i += 1,
        }
    }
    out.push_str(&template[literal_start..]);
    Ok(out)
}
