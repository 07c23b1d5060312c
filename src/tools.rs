//! World Cup knowledge tools exposed to the model as function calls.
//!
//! None of these look anything up. Each returns a small hint object telling
//! the model to answer from its own knowledge about the requested subject.
//! The web-enabled agent uses hosted Google Search instead; its answers are
//! ranked for display with [`relevance`].

use crate::llm::FunctionDeclaration;
use serde_json::{Value, json};
use tracing::debug;

pub const KNOWLEDGE_ACTION: &str = "use_gemini_knowledge";

const SEARCH_INSTRUCTION: &str =
    "Usa tu conocimiento interno sobre la Copa del Mundo para responder esta consulta específica";
const PLAYER_INSTRUCTION: &str = "Proporciona estadísticas detalladas de este jugador en Copas del Mundo usando tu conocimiento interno";
const COUNTRY_INSTRUCTION: &str =
    "Proporciona información completa sobre el rendimiento de este país en Copas del Mundo";
const FUN_FACTS_INSTRUCTION: &str =
    "Comparte datos curiosos e interesantes sobre la Copa del Mundo relacionados con este tema";

pub const DEFAULT_PLAYER_CONTEXT: &str = "world_cup";
pub const DEFAULT_TOPIC: &str = "general";

const FOOTBALL_KEYWORDS: &[&str] = &[
    "fifa",
    "world cup",
    "copa mundial",
    "football",
    "soccer",
    "futbol",
    "player",
    "jugador",
    "goal",
    "gol",
    "team",
    "equipo",
    "champion",
    "campeón",
    "tournament",
    "torneo",
    "match",
    "partido",
];

const HEADLINE_KEYWORDS: &[&str] = &["fifa", "world cup", "copa mundial"];

pub fn search_world_cup_info(query: &str, year: Option<i64>) -> Value {
    json!({
        "action": KNOWLEDGE_ACTION,
        "query": query,
        "year": year,
        "instruction": SEARCH_INSTRUCTION,
    })
}

pub fn get_player_statistics(player_name: &str, context: Option<&str>) -> Value {
    json!({
        "action": KNOWLEDGE_ACTION,
        "player": player_name,
        "context": context.unwrap_or(DEFAULT_PLAYER_CONTEXT),
        "instruction": PLAYER_INSTRUCTION,
    })
}

pub fn get_country_performance(country: &str) -> Value {
    json!({
        "action": KNOWLEDGE_ACTION,
        "country": country,
        "instruction": COUNTRY_INSTRUCTION,
    })
}

pub fn get_fun_facts(topic: Option<&str>) -> Value {
    json!({
        "action": KNOWLEDGE_ACTION,
        "topic": topic.unwrap_or(DEFAULT_TOPIC),
        "instruction": FUN_FACTS_INSTRUCTION,
    })
}

/// Build the function declarations sent to the model.
pub fn function_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: "search_world_cup_info".into(),
            description: "Busca información específica sobre Mundiales: ganadores, goleadores, \
                          finales, sedes. Úsala para preguntas sobre un torneo concreto."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Consulta específica (ej: \"ganador\", \"goleador\", \"final\")."
                    },
                    "year": {
                        "type": "integer",
                        "description": "Año del Mundial. Omitir si la consulta no es de un año concreto."
                    }
                },
                "required": ["query"]
            }),
        },
        FunctionDeclaration {
            name: "get_player_statistics".into(),
            description: "Obtiene estadísticas de un jugador: goles, partidos y títulos en \
                          Copas del Mundo o en su carrera."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "player_name": {
                        "type": "string",
                        "description": "Nombre del jugador."
                    },
                    "context": {
                        "type": "string",
                        "description": "Contexto (ej: \"world_cup\", \"career\", \"specific_year\"). Por defecto \"world_cup\"."
                    }
                },
                "required": ["player_name"]
            }),
        },
        FunctionDeclaration {
            name: "get_country_performance".into(),
            description: "Información sobre el rendimiento histórico de un país en Copas del \
                          Mundo: títulos, finales, participaciones."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "country": {
                        "type": "string",
                        "description": "Nombre del país."
                    }
                },
                "required": ["country"]
            }),
        },
        FunctionDeclaration {
            name: "get_fun_facts".into(),
            description: "Datos curiosos sobre la Copa del Mundo relacionados con un tema.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "Tema (ej: \"records\", \"history\", \"players\"). Por defecto \"general\"."
                    }
                }
            }),
        },
    ]
}

/// Dispatch a function call by name. Returns `(response_object, is_error)`.
pub fn dispatch(tool_name: &str, args: &Value) -> (Value, bool) {
    debug!(tool = tool_name, "dispatching tool call");
    match tool_name {
        "search_world_cup_info" => match args["query"].as_str() {
            Some(query) => (search_world_cup_info(query, parse_year(&args["year"])), false),
            None => missing("query"),
        },
        "get_player_statistics" => match args["player_name"].as_str() {
            Some(player) => (
                get_player_statistics(player, args["context"].as_str()),
                false,
            ),
            None => missing("player_name"),
        },
        "get_country_performance" => match args["country"].as_str() {
            Some(country) => (get_country_performance(country), false),
            None => missing("country"),
        },
        "get_fun_facts" => (get_fun_facts(args["topic"].as_str()), false),
        _ => (json!({ "error": format!("Unknown tool: {tool_name}") }), true),
    }
}

fn missing(param: &str) -> (Value, bool) {
    (
        json!({ "error": format!("Missing '{param}' parameter") }),
        true,
    )
}

/// Models sometimes send numbers as strings; accept both.
fn parse_year(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().map(|f| f as i64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub fn is_football_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    FOOTBALL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Query words present in `text`, plus 2 per headline keyword.
pub fn relevance(text: &str, query: &str) -> u32 {
    let text = text.to_lowercase();
    let query = query.to_lowercase();

    let word_hits = query
        .split_whitespace()
        .filter(|w| text.contains(w))
        .count() as u32;
    let headline_hits = HEADLINE_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .count() as u32;

    word_hits + 2 * headline_hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fun_facts_defaults_to_general() {
        assert_eq!(
            get_fun_facts(None),
            json!({
                "action": "use_gemini_knowledge",
                "topic": "general",
                "instruction": FUN_FACTS_INSTRUCTION,
            })
        );
    }

    #[test]
    fn search_keeps_null_year() {
        let v = search_world_cup_info("ganador", None);
        assert!(v.as_object().unwrap().contains_key("year"));
        assert!(v["year"].is_null());
        assert_eq!(search_world_cup_info("ganador", Some(2014))["year"], 2014);
    }

    #[test]
    fn player_context_defaults_to_world_cup() {
        let v = get_player_statistics("Messi", None);
        assert_eq!(v["player"], "Messi");
        assert_eq!(v["context"], "world_cup");
        assert_eq!(get_player_statistics("Messi", Some("career"))["context"], "career");
    }

    #[test]
    fn year_accepts_strings_and_floats() {
        assert_eq!(parse_year(&json!(2022)), Some(2022));
        assert_eq!(parse_year(&json!("1986")), Some(1986));
        assert_eq!(parse_year(&json!(2018.0)), Some(2018));
        assert_eq!(parse_year(&json!("next year")), None);
        assert_eq!(parse_year(&Value::Null), None);
    }

    #[test]
    fn declarations_match_dispatchable_tools() {
        for decl in function_declarations() {
            let (resp, is_error) = dispatch(&decl.name, &json!({
                "query": "q", "player_name": "p", "country": "c"
            }));
            assert!(!is_error, "{} failed: {resp}", decl.name);
            assert_eq!(resp["action"], KNOWLEDGE_ACTION);
        }
    }

    #[test]
    fn football_keywords_are_case_insensitive() {
        assert!(is_football_related("Who won the FIFA World Cup?"));
        assert!(is_football_related("¿Quién es el máximo GOLeador?"));
        assert!(!is_football_related("What is the capital of Peru?"));
    }

    #[test]
    fn relevance_scores_words_and_headlines() {
        assert_eq!(relevance("Messi scores in the final", "messi final"), 2);
        assert_eq!(relevance("FIFA World Cup 2022 final", "final"), 5);
        assert_eq!(relevance("weather today", "messi"), 0);
    }
}
