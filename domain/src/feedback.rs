//! Feedback aggregation.
//!
//! Turns behavior evaluations into a numeric score and coaching findings, and
//! runs the independent general-feedback path against the completion model
//! with an anti-repetition snapshot of recent feedback. Both paths persist
//! through the same read-merge-write upsert so they can finish in either
//! order without clobbering each other.

pub use entity::feedback::Model;
pub use entity_api::feedback_record::find_by_call_id;

use crate::error::Error;
use call_ai::types::completion::CompletionRequest;
use call_ai::CompletionModel;
use entity::behavior_evaluation::{BehaviorEvaluation, BehaviorEvaluations, Evaluation};
use entity::call_result::CallResult;
use entity::phrase_list::PhraseList;
use entity::product_type::ProductType;
use entity::{calls, Id};
use entity_api::feedback_record::{self, FeedbackPatch};
use log::*;
use rand::Rng;
use regex::Regex;
use sea_orm::DatabaseConnection;
use std::sync::OnceLock;

/// How many recent feedback rows feed the anti-repetition snapshot.
const RECENT_FEEDBACK_LIMIT: u64 = 10;

const MAX_FINDINGS: usize = 5;
const MIN_FINDINGS: usize = 3;

/// Default system prompt for the general feedback path.
pub const DEFAULT_FEEDBACK_PROMPT: &str = "Eres un coach de calidad de un centro de atención \
telefónica. Analiza la transcripción de la llamada y entrega retroalimentación accionable para \
el asesor. Estructura tu respuesta exactamente con estas secciones, cada una con viñetas:\n\
Aspectos positivos:\n- ...\nÁreas de mejora:\n- ...\nOportunidades:\n- ...\n\
Al final indica en una línea el sentimiento general del cliente (positivo, neutral o negativo), \
el resultado de la llamada (venta o no venta), el producto tratado (fijo o móvil) y, si no hubo \
venta, el motivo principal.";

/// Pre-authored phrase variants keyed by substrings of behavior names.
struct PhraseBucket {
    keywords: &'static [&'static str],
    positive: &'static [&'static str],
    opportunity: &'static [&'static str],
}

const BEHAVIOR_BUCKETS: &[PhraseBucket] = &[
    PhraseBucket {
        keywords: &["saludo", "presentaci", "apertura"],
        positive: &[
            "El asesor abre la llamada con un saludo claro y se identifica",
            "Buena presentación inicial ante el cliente",
            "El saludo inicial transmite cercanía y profesionalismo",
        ],
        opportunity: &[
            "Reforzar el saludo inicial identificándose con nombre y empresa",
            "Trabajar una apertura de llamada más cálida y completa",
        ],
    },
    PhraseBucket {
        keywords: &["escucha", "empat"],
        positive: &[
            "Demuestra escucha activa retomando lo que el cliente expresa",
            "El asesor deja hablar al cliente sin interrumpirlo",
        ],
        opportunity: &[
            "Practicar la escucha activa evitando interrumpir al cliente",
            "Parafrasear las necesidades del cliente antes de responder",
        ],
    },
    PhraseBucket {
        keywords: &["objecion", "objeción"],
        positive: &[
            "Maneja las objeciones del cliente con argumentos concretos",
            "Responde las objeciones sin perder el control de la llamada",
        ],
        opportunity: &[
            "Preparar más argumentos para responder objeciones de precio",
            "Profundizar en el manejo de objeciones antes de ceder",
        ],
    },
    PhraseBucket {
        keywords: &["cierre"],
        positive: &[
            "Cierra la llamada resumiendo los acuerdos alcanzados",
            "El cierre de la llamada deja claros los próximos pasos",
        ],
        opportunity: &[
            "Cerrar la llamada confirmando próximos pasos con el cliente",
            "Trabajar un cierre que invite a concretar la venta",
        ],
    },
    PhraseBucket {
        keywords: &["verifica", "identidad", "datos"],
        positive: &["Verifica los datos del cliente antes de avanzar con la gestión"],
        opportunity: &["Verificar la identidad del cliente al inicio de la gestión"],
    },
];

/// Context phrases triggered by keywords in the call summary.
const SUMMARY_POSITIVE: &[(&str, &str)] = &[
    ("agradec", "El cliente agradece la atención recibida"),
    ("amable", "Trato cordial percibido por el cliente"),
    ("cordial", "Trato cordial percibido por el cliente"),
];

const SUMMARY_OPPORTUNITY: &[(&str, &str)] = &[
    (
        "precio",
        "Anticipar la objeción de precio destacando el valor del plan",
    ),
    (
        "caro",
        "Anticipar la objeción de precio destacando el valor del plan",
    ),
    (
        "reclamo",
        "Dar seguimiento explícito a los reclamos mencionados en la llamada",
    ),
    (
        "queja",
        "Dar seguimiento explícito a los reclamos mencionados en la llamada",
    ),
    (
        "competencia",
        "Preparar comparativos frente a ofertas de la competencia",
    ),
];

const GENERIC_POSITIVE: &[&str] = &[
    "Mantiene un tono profesional durante la llamada",
    "La conversación se desarrolla con respeto y claridad",
    "El asesor mantiene el control de la conversación",
];

const GENERIC_OPPORTUNITY: &[&str] = &[
    "Profundizar en las necesidades del cliente con preguntas abiertas",
    "Personalizar la oferta según el perfil del cliente",
    "Reforzar los beneficios del producto durante la conversación",
];

const GENERIC_NEGATIVE: &str = "Se identificaron oportunidades de mejora en la llamada";

/// Deterministic score: percentage of `cumple` verdicts, 0 when empty.
pub fn compute_score(evaluations: &[BehaviorEvaluation]) -> i32 {
    if evaluations.is_empty() {
        return 0;
    }
    let cumple = evaluations
        .iter()
        .filter(|evaluation| evaluation.evaluation == Evaluation::Cumple)
        .count();
    (100.0 * cumple as f64 / evaluations.len() as f64).round() as i32
}

fn first_clause(comments: &str) -> Option<String> {
    let clause = comments
        .split(['.', ','])
        .next()
        .map(str::trim)
        .filter(|clause| !clause.is_empty())?;
    Some(clause.to_string())
}

/// Short negative points derived from `no cumple` evaluations.
///
/// Never empty: when every behavior passed, a generic placeholder keeps the
/// coaching section populated.
pub fn negative_findings(evaluations: &[BehaviorEvaluation]) -> Vec<String> {
    let mut findings: Vec<String> = evaluations
        .iter()
        .filter(|evaluation| evaluation.evaluation == Evaluation::NoCumple)
        .filter_map(|evaluation| first_clause(&evaluation.comments))
        .take(MAX_FINDINGS)
        .collect();

    if findings.is_empty() {
        findings.push(GENERIC_NEGATIVE.to_string());
    }
    findings
}

fn pick<'a, R: Rng>(rng: &mut R, variants: &[&'a str]) -> &'a str {
    variants[rng.gen_range(0..variants.len())]
}

fn push_unique(findings: &mut Vec<String>, phrase: &str) {
    if !findings.iter().any(|existing| existing == phrase) {
        findings.push(phrase.to_string());
    }
}

fn pad_and_cap(findings: &mut Vec<String>, generics: &[&str]) {
    for generic in generics {
        if findings.len() >= MIN_FINDINGS {
            break;
        }
        push_unique(findings, generic);
    }
    findings.truncate(MAX_FINDINGS);
}

/// Rule-based positive and opportunity findings from behavior names and the
/// call summary, with pseudo-random phrase variants for variety.
pub fn rule_based_findings<R: Rng>(
    rng: &mut R,
    evaluations: &[BehaviorEvaluation],
    summary: Option<&str>,
) -> (Vec<String>, Vec<String>) {
    let mut positive = Vec::new();
    let mut opportunities = Vec::new();

    for evaluation in evaluations {
        let name = evaluation.behavior_name.to_lowercase();
        for bucket in BEHAVIOR_BUCKETS {
            if !bucket.keywords.iter().any(|keyword| name.contains(keyword)) {
                continue;
            }
            match evaluation.evaluation {
                Evaluation::Cumple => push_unique(&mut positive, pick(rng, bucket.positive)),
                Evaluation::NoCumple => {
                    push_unique(&mut opportunities, pick(rng, bucket.opportunity))
                }
            }
        }
    }

    if let Some(summary) = summary {
        let lowered = summary.to_lowercase();
        for (keyword, phrase) in SUMMARY_POSITIVE {
            if lowered.contains(keyword) {
                push_unique(&mut positive, phrase);
            }
        }
        for (keyword, phrase) in SUMMARY_OPPORTUNITY {
            if lowered.contains(keyword) {
                push_unique(&mut opportunities, phrase);
            }
        }
    }

    pad_and_cap(&mut positive, GENERIC_POSITIVE);
    pad_and_cap(&mut opportunities, GENERIC_OPPORTUNITY);

    (positive, opportunities)
}

/// Persists the behavior-path results for a call.
///
/// Writes score and behavior evaluations through the merging upsert. The
/// rule-based findings only fill in sections the general feedback path has
/// not populated yet, so the two paths can finish in either order.
pub async fn apply_behavior_results(
    db: &DatabaseConnection,
    call_id: Id,
    summary: Option<&str>,
    evaluations: Vec<BehaviorEvaluation>,
) -> Result<Model, Error> {
    let score = compute_score(&evaluations);
    let negative = negative_findings(&evaluations);
    let (positive, opportunities) =
        rule_based_findings(&mut rand::thread_rng(), &evaluations, summary);

    info!(
        "Persisting behavior results for call {call_id}: score {score}, {} evaluations",
        evaluations.len()
    );

    let existing = feedback_record::find_by_call_id(db, call_id).await?;
    let keep_if_empty = |current: Option<&PhraseList>, generated: Vec<String>| match current {
        Some(list) if !list.is_empty() => None,
        _ => Some(PhraseList::new(generated)),
    };

    let patch = FeedbackPatch {
        score: Some(score),
        positive: keep_if_empty(existing.as_ref().map(|f| &f.positive), positive),
        negative: keep_if_empty(existing.as_ref().map(|f| &f.negative), negative),
        opportunities: keep_if_empty(existing.as_ref().map(|f| &f.opportunities), opportunities),
        behaviors_analysis: Some(BehaviorEvaluations(evaluations)),
        ..Default::default()
    };

    Ok(feedback_record::upsert_patch(db, call_id, patch).await?)
}

/// Read-only snapshot of recently generated phrases, injected into the
/// general-feedback prompt as patterns to avoid.
#[derive(Debug, Clone, Default)]
pub struct RecentPhrases {
    pub phrases: Vec<String>,
}

impl RecentPhrases {
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Fetches the anti-repetition snapshot for an account.
pub async fn recent_phrases(
    db: &DatabaseConnection,
    account_id: Id,
) -> Result<RecentPhrases, Error> {
    let rows = feedback_record::find_recent_for_account(db, account_id, RECENT_FEEDBACK_LIMIT).await?;

    let mut phrases = Vec::new();
    for row in rows {
        for phrase in row
            .positive
            .iter()
            .chain(row.negative.iter())
            .chain(row.opportunities.iter())
        {
            if !phrases.iter().any(|existing: &String| existing == phrase) {
                phrases.push(phrase.clone());
            }
        }
    }

    Ok(RecentPhrases { phrases })
}

/// Structured output of the general feedback path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralFeedback {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub opportunities: Vec<String>,
    pub sentiment: Option<String>,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub result: Option<CallResult>,
    pub product: Option<ProductType>,
    pub non_sale_reason: Option<String>,
}

fn is_section_header(line: &str) -> bool {
    let normalized = normalize_header(line);
    ["aspectos positivos", "áreas de mejora", "areas de mejora", "oportunidades"]
        .iter()
        .any(|header| normalized.starts_with(header))
}

fn normalize_header(line: &str) -> String {
    line.trim()
        .trim_start_matches(['#', '*', '-', ' '])
        .trim_end_matches(['*', ':', ' '])
        .to_lowercase()
}

fn section_items(text: &str, headers: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    let mut collecting = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if is_section_header(trimmed) {
            let normalized = normalize_header(trimmed);
            collecting = headers.iter().any(|header| normalized.starts_with(header));
            continue;
        }

        if !collecting || trimmed.is_empty() {
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('*'))
            .or_else(|| trimmed.strip_prefix('•'))
        {
            let item = item.trim().trim_end_matches('.').trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        } else {
            // Non-bullet prose ends the section.
            collecting = false;
        }
    }

    items
}

fn detect_sentiment(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let index = lowered.find("sentimiento")?;
    let tail = &lowered[index..];
    for candidate in ["positivo", "negativo", "neutral", "neutro"] {
        if tail.contains(candidate) {
            let normalized = if candidate == "neutro" { "neutral" } else { candidate };
            return Some(normalized.to_string());
        }
    }
    None
}

fn detect_result(text: &str) -> Option<CallResult> {
    let lowered = text.to_lowercase();

    const NO_SALE: &[&str] = &[
        "no venta",
        "no se concret",
        "no acept",
        "sin venta",
        "venta no realizada",
        "rechaz",
    ];
    const SALE: &[&str] = &[
        "venta exitosa",
        "venta realizada",
        "se concret",
        "acepta la oferta",
        "aceptó la oferta",
        "cierre de venta",
    ];

    if NO_SALE.iter().any(|signal| lowered.contains(signal)) {
        Some(CallResult::NoVenta)
    } else if SALE.iter().any(|signal| lowered.contains(signal)) {
        Some(CallResult::Venta)
    } else {
        None
    }
}

fn detect_product(text: &str) -> Option<ProductType> {
    let lowered = text.to_lowercase();

    let fijo = ["internet hogar", "línea fija", "linea fija", "fijo"]
        .iter()
        .filter_map(|keyword| lowered.find(keyword))
        .min();
    let movil = ["móvil", "movil", "celular", "portabilidad"]
        .iter()
        .filter_map(|keyword| lowered.find(keyword))
        .min();

    match (fijo, movil) {
        (Some(f), Some(m)) if f <= m => Some(ProductType::Fijo),
        (Some(_), Some(_)) => Some(ProductType::Movil),
        (Some(_), None) => Some(ProductType::Fijo),
        (None, Some(_)) => Some(ProductType::Movil),
        (None, None) => None,
    }
}

fn detect_non_sale_reason(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();

    const REASONS: &[(&[&str], &str)] = &[
        (&["precio", "caro", "costoso"], "Precio elevado"),
        (&["ya tiene", "ya cuenta con"], "Ya cuenta con el servicio"),
        (&["no le interesa", "sin interés", "no está interesado"], "Sin interés en la oferta"),
        (&["pensarlo", "consultarlo", "lo va a pensar"], "Quiere pensarlo"),
        (&["no tiene tiempo", "ocupado"], "Sin tiempo para atender la oferta"),
    ];

    REASONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, reason)| reason.to_string())
}

/// Conversation topics keyed by substrings of the feedback prose.
const TOPIC_KEYWORDS: &[(&[&str], &str)] = &[
    (&["precio", "tarifa", "costo", "caro"], "Precio"),
    (&["factur", "cobro", "recibo"], "Facturación"),
    (&["portabilidad"], "Portabilidad"),
    (&["internet hogar", "fibra", "línea fija", "linea fija"], "Internet hogar"),
    (&["plan móvil", "plan movil", "celular", "datos móviles", "datos moviles"], "Plan móvil"),
    (&["reclamo", "queja"], "Reclamo"),
    (&["renovaci", "renovar"], "Renovación de contrato"),
    (&["soporte", "técnic", "tecnic", "falla"], "Soporte técnico"),
    (&["promoci", "descuento", "oferta"], "Promociones"),
];

fn detect_topics(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, topic)| topic.to_string())
        .collect()
}

struct EntityPatterns {
    plan: Regex,
    quantities: Regex,
    amounts: Regex,
}

fn entity_patterns() -> &'static EntityPatterns {
    static PATTERNS: OnceLock<EntityPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Patterns are fixed at compile time; construction cannot fail.
        EntityPatterns {
            plan: Regex::new(r"(?i)\bplan ([a-záéíóúñ]+)").unwrap(),
            quantities: Regex::new(r"(?i)\b\d+\s?(?:gb|gigas|megas|minutos)\b").unwrap(),
            amounts: Regex::new(r"(?i)(?:\$|S/\.?|€)\s?\d+(?:[.,]\d+)?").unwrap(),
        }
    })
}

/// Concrete mentions worth tagging the call with: named plans, data or
/// minute quantities, and monetary amounts.
fn detect_entities(text: &str) -> Vec<String> {
    const PLAN_STOPWORDS: &[&str] = &["de", "del", "que", "con", "para", "el", "la", "los", "las"];

    let patterns = entity_patterns();
    let mut entities = Vec::new();

    for captures in patterns.plan.captures_iter(text) {
        let name = captures[1].to_lowercase();
        if !PLAN_STOPWORDS.contains(&name.as_str()) {
            push_unique(&mut entities, captures[0].trim());
        }
    }
    for pattern in [&patterns.quantities, &patterns.amounts] {
        for found in pattern.find_iter(text) {
            push_unique(&mut entities, found.as_str().trim());
        }
    }

    entities.truncate(MAX_FINDINGS);
    entities
}

/// Parses the model's general feedback prose into structured findings.
pub fn parse_general_feedback(text: &str) -> GeneralFeedback {
    GeneralFeedback {
        positive: section_items(text, &["aspectos positivos"]),
        negative: section_items(text, &["áreas de mejora", "areas de mejora"]),
        opportunities: section_items(text, &["oportunidades"]),
        sentiment: detect_sentiment(text),
        topics: detect_topics(text),
        entities: detect_entities(text),
        result: detect_result(text),
        product: detect_product(text),
        non_sale_reason: detect_non_sale_reason(text),
    }
}

/// Runs the general feedback model call for one transcript.
///
/// Recent phrases are injected as patterns to avoid, and sampling penalties
/// bias against repeating them.
pub async fn generate_general_feedback(
    model: &dyn CompletionModel,
    system_prompt: &str,
    transcript: &str,
    recent: &RecentPhrases,
) -> Result<GeneralFeedback, Error> {
    let system = if recent.is_empty() {
        system_prompt.to_string()
    } else {
        format!(
            "{system_prompt}\n\nEvita repetir estas frases usadas en retroalimentaciones \
             recientes:\n{}",
            recent
                .phrases
                .iter()
                .map(|phrase| format!("- {phrase}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    let request = CompletionRequest::new(transcript)
        .with_system(system)
        .with_temperature(0.8)
        .with_repetition_penalties(1.0, 1.0);

    let raw = model.complete(request).await?;
    Ok(parse_general_feedback(&raw))
}

/// Persists general feedback findings and the derived call classification.
pub async fn apply_general_feedback(
    db: &DatabaseConnection,
    call: &calls::Model,
    general: GeneralFeedback,
) -> Result<Model, Error> {
    debug!("Persisting general feedback for call {}", call.id);

    let topics = (!general.topics.is_empty()).then(|| PhraseList::new(general.topics));
    let entities = (!general.entities.is_empty()).then(|| PhraseList::new(general.entities));

    let patch = FeedbackPatch {
        positive: Some(PhraseList::new(general.positive)),
        negative: Some(PhraseList::new(general.negative)),
        opportunities: Some(PhraseList::new(general.opportunities)),
        sentiment: general.sentiment.clone(),
        topics: topics.clone(),
        entities: entities.clone(),
        ..Default::default()
    };

    let model = feedback_record::upsert_patch(db, call.id, patch).await?;

    crate::call::update_classification(
        db,
        call.id,
        general.sentiment,
        topics,
        entities,
        general.result,
        general.product,
        general.non_sale_reason,
    )
    .await?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn evaluation(name: &str, verdict: Evaluation, comments: &str) -> BehaviorEvaluation {
        BehaviorEvaluation {
            behavior_name: name.to_string(),
            evaluation: verdict,
            comments: comments.to_string(),
        }
    }

    #[test]
    fn score_is_the_rounded_cumple_percentage() {
        let evaluations = vec![
            evaluation("a", Evaluation::Cumple, ""),
            evaluation("b", Evaluation::Cumple, ""),
            evaluation("c", Evaluation::Cumple, ""),
            evaluation("d", Evaluation::NoCumple, ""),
        ];
        assert_eq!(compute_score(&evaluations), 75);

        let one_of_three = vec![
            evaluation("a", Evaluation::Cumple, ""),
            evaluation("b", Evaluation::NoCumple, ""),
            evaluation("c", Evaluation::NoCumple, ""),
        ];
        assert_eq!(compute_score(&one_of_three), 33);

        assert_eq!(compute_score(&[]), 0);
    }

    #[test]
    fn negative_findings_take_the_first_clause() {
        let evaluations = vec![evaluation(
            "Saludo",
            Evaluation::NoCumple,
            "No se identificó al inicio, aunque el tono fue correcto. Mejorar apertura.",
        )];
        let findings = negative_findings(&evaluations);
        assert_eq!(findings, vec!["No se identificó al inicio".to_string()]);
    }

    #[test]
    fn negative_findings_fall_back_to_a_placeholder() {
        let evaluations = vec![evaluation("Saludo", Evaluation::Cumple, "Bien")];
        let findings = negative_findings(&evaluations);
        assert_eq!(findings, vec![GENERIC_NEGATIVE.to_string()]);
    }

    #[test]
    fn negative_findings_are_capped_at_five() {
        let evaluations: Vec<BehaviorEvaluation> = (0..8)
            .map(|i| {
                evaluation(
                    "x",
                    Evaluation::NoCumple,
                    &format!("Falla número {i} detectada"),
                )
            })
            .collect();
        assert_eq!(negative_findings(&evaluations).len(), 5);
    }

    #[test]
    fn rule_based_findings_map_behavior_names_to_buckets() {
        let mut rng = StdRng::seed_from_u64(7);
        let evaluations = vec![
            evaluation("Saludo inicial", Evaluation::Cumple, ""),
            evaluation("Manejo de objeciones", Evaluation::NoCumple, ""),
        ];

        let (positive, opportunities) = rule_based_findings(&mut rng, &evaluations, None);

        assert!(positive
            .iter()
            .any(|phrase| phrase.to_lowercase().contains("salud")
                || phrase.to_lowercase().contains("presentación")));
        assert!(opportunities
            .iter()
            .any(|phrase| phrase.to_lowercase().contains("objecion")));
    }

    #[test]
    fn rule_based_findings_are_padded_to_at_least_three() {
        let mut rng = StdRng::seed_from_u64(7);
        let (positive, opportunities) = rule_based_findings(&mut rng, &[], None);
        assert!(positive.len() >= 3);
        assert!(opportunities.len() >= 3);
    }

    #[test]
    fn rule_based_findings_pick_up_summary_context() {
        let mut rng = StdRng::seed_from_u64(7);
        let (_, opportunities) = rule_based_findings(
            &mut rng,
            &[],
            Some("El cliente consideró que el plan era muy caro"),
        );
        assert!(opportunities
            .iter()
            .any(|phrase| phrase.contains("objeción de precio")));
    }

    #[test]
    fn general_feedback_sections_are_extracted_from_prose() {
        let text = "Aquí está el análisis:\n\n\
            Aspectos positivos:\n\
            - Saluda con claridad\n\
            - Mantiene un tono amable\n\n\
            Áreas de mejora:\n\
            - No verificó los datos del cliente.\n\n\
            Oportunidades:\n\
            - Ofrecer el plan familiar\n\n\
            Sentimiento general: neutral. Resultado: no venta, el cliente indicó que el plan \
            era muy caro. Producto: plan móvil.";

        let general = parse_general_feedback(text);
        assert_eq!(general.positive.len(), 2);
        assert_eq!(general.negative, vec!["No verificó los datos del cliente"]);
        assert_eq!(general.opportunities, vec!["Ofrecer el plan familiar"]);
        assert_eq!(general.sentiment.as_deref(), Some("neutral"));
        assert!(general.topics.contains(&"Precio".to_string()));
        assert!(general.topics.contains(&"Plan móvil".to_string()));
        assert!(general.entities.contains(&"plan familiar".to_string()));
        assert_eq!(general.result, Some(CallResult::NoVenta));
        assert_eq!(general.product, Some(ProductType::Movil));
        assert_eq!(general.non_sale_reason.as_deref(), Some("Precio elevado"));
    }

    #[test]
    fn topics_come_from_keyword_buckets() {
        let topics = detect_topics("El cliente preguntó por la facturación y pidió un descuento");
        assert!(topics.contains(&"Facturación".to_string()));
        assert!(topics.contains(&"Promociones".to_string()));

        assert!(detect_topics("Conversación sin temas reconocibles").is_empty());
    }

    #[test]
    fn entities_capture_plans_quantities_and_amounts() {
        let entities =
            detect_entities("Le ofreció el plan Conecta de 50 GB por $29.90 al mes");
        assert!(entities.contains(&"plan Conecta".to_string()));
        assert!(entities.contains(&"50 GB".to_string()));
        assert!(entities.contains(&"$29.90".to_string()));
    }

    #[test]
    fn entities_skip_plan_followed_by_filler_words() {
        assert!(detect_entities("habló del plan de contingencia").is_empty());
    }

    #[test]
    fn result_detection_prefers_no_sale_signals() {
        assert_eq!(detect_result("no se concretó la venta"), Some(CallResult::NoVenta));
        assert_eq!(detect_result("se concretó la venta del plan"), Some(CallResult::Venta));
        assert_eq!(detect_result("el cliente pidió información"), None);
    }

    #[test]
    fn product_detection_uses_first_mention() {
        assert_eq!(
            detect_product("ofreció internet hogar y luego un plan móvil"),
            Some(ProductType::Fijo)
        );
        assert_eq!(detect_product("portabilidad de celular"), Some(ProductType::Movil));
        assert_eq!(detect_product("sin producto claro"), None);
    }

    #[tokio::test]
    async fn general_feedback_injects_anti_repetition_phrases() {
        use call_ai::MockCompletionModel;

        let recent = RecentPhrases {
            phrases: vec!["Saluda con claridad".to_string()],
        };

        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .withf(|request| {
                let system = request.system.as_deref().unwrap_or("");
                system.contains("Evita repetir")
                    && system.contains("Saluda con claridad")
                    && request.frequency_penalty == Some(1.0)
                    && request.presence_penalty == Some(1.0)
            })
            .returning(|_| Ok("Aspectos positivos:\n- Tono cordial\n".to_string()));

        let general =
            generate_general_feedback(&model, DEFAULT_FEEDBACK_PROMPT, "transcripción", &recent)
                .await
                .unwrap();
        assert_eq!(general.positive, vec!["Tono cordial"]);
    }
}

#[cfg(all(test, feature = "mock"))]
mod persistence_tests {
    use super::*;
    use entity::call_status::CallStatus;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn call_row() -> calls::Model {
        let now = chrono::Utc::now();
        calls::Model {
            id: Id::new_v4(),
            account_id: Id::new_v4(),
            title: "llamada_enero".to_string(),
            filename: "llamada_enero.mp3".to_string(),
            audio_url: None,
            duration_seconds: None,
            status: CallStatus::Analyzing,
            progress: 85,
            transcription: None,
            summary: None,
            sentiment: None,
            topics: None,
            entities: None,
            result: None,
            product: None,
            non_sale_reason: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn feedback_row(call_id: Id) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            call_id,
            score: 50,
            positive: PhraseList::default(),
            negative: PhraseList::default(),
            opportunities: PhraseList::default(),
            behaviors_analysis: BehaviorEvaluations::default(),
            sentiment: None,
            topics: None,
            entities: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn general_feedback_persists_topics_and_entities() {
        let call = call_row();
        let existing = feedback_row(call.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![call.clone()]])
            .append_query_results([vec![call.clone()]])
            .into_connection();

        let general = GeneralFeedback {
            positive: vec!["Tono cordial".to_string()],
            sentiment: Some("neutral".to_string()),
            topics: vec!["Precio".to_string()],
            entities: vec!["plan Conecta".to_string()],
            ..Default::default()
        };

        apply_general_feedback(&db, &call, general).await.unwrap();

        let log = db.into_transaction_log();
        let feedback_update = format!("{:?}", log[1]);
        assert!(feedback_update.contains("\"topics\""));
        assert!(feedback_update.contains("\"entities\""));

        let classification_update = format!("{:?}", log[3]);
        assert!(classification_update.contains("\"topics\""));
        assert!(classification_update.contains("\"entities\""));
    }
}
