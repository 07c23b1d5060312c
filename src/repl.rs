//! Interactive question/answer loop.

use crate::agent::{FifaAgent, Session};
use crate::config::Variant;
use crate::error::Result;
use std::future::Future;
use std::io::{ErrorKind, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const EXIT_WORDS: &[&str] = &["salir", "exit", "quit"];
pub const PROMPT: &str = "👤 Tu pregunta: ";
pub const FAREWELL: &str = "👋 ¡Hasta luego!";

pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Something that answers one question at a time.
pub trait Responder {
    fn respond(&mut self, query: &str) -> impl Future<Output = Result<String>>;
}

/// An agent plus the conversation it is having.
pub struct ChatSession {
    agent: FifaAgent,
    session: Session,
}

impl ChatSession {
    pub fn new(agent: FifaAgent, max_history_exchanges: usize) -> Self {
        Self {
            agent,
            session: Session::new(max_history_exchanges),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Responder for ChatSession {
    async fn respond(&mut self, query: &str) -> Result<String> {
        let reply = self.agent.respond(&mut self.session, query).await?;
        if !reply.search_queries.is_empty() {
            debug!(queries = ?reply.search_queries, "model searched the web");
        }
        Ok(reply.render())
    }
}

/// Per-variant text around the loop.
#[derive(Debug, Clone)]
pub struct Banner {
    pub intro: Vec<String>,
    pub thinking: String,
    pub speaker: String,
}

impl Banner {
    pub fn for_variant(variant: Variant) -> Self {
        let lines = |ls: &[&str]| ls.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match variant {
            Variant::Classic => Self {
                intro: lines(&[
                    "🏆 FIFA World Cup Agent - ¡Pregúntame sobre la Copa del Mundo!",
                    "Ejemplos: '¿Quién ganó en 2014?', '¿Cuántos goles hizo Messi en 2022?', '¿Qué país tiene más Mundiales?'",
                    "Escribe 'salir' para terminar.",
                    "",
                ]),
                thinking: "🤖 Gemini está procesando tu pregunta...".into(),
                speaker: "Agente".into(),
            },
            Variant::Plus => Self {
                intro: lines(&[
                    "🏆 FIFA World Cup Agent Plus - Gemini 2.5 Flash con Google Search",
                    "🧠 Capacidades:",
                    "   • Conocimiento extenso sobre Copas del Mundo (1930-2022)",
                    "   • Búsqueda web en tiempo real con Google Search",
                    "   • Estadísticas detalladas de jugadores y países",
                    "   • Noticias actuales de FIFA y fútbol",
                    "   • Datos curiosos y récords históricos",
                    "   • Análisis de rendimiento por países",
                    "",
                    "Ejemplos de consultas:",
                    "• '¿Quién ganó la Copa del Mundo 2022?'",
                    "• '¿Cuáles son las últimas noticias de FIFA?'",
                    "• '¿Cuáles son los máximos goleadores de Mundiales?'",
                    "• 'Información actual sobre Messi 2024'",
                    "• 'Datos curiosos sobre la Copa del Mundo'",
                    "• '¿Cuál fue el mejor Mundial de la historia?'",
                    "",
                    "Escribe 'salir' para terminar.",
                    "",
                ]),
                thinking: "🤖 Gemini 2.5 Flash con herramientas procesando...".into(),
                speaker: "Experto FIFA".into(),
            },
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ExitCommand,
    EndOfInput,
    Interrupted,
}

/// Read questions from `input` until an exit word, end of input or Ctrl-C.
///
/// Errors from a turn are printed and the loop goes on; only I/O failures on
/// the terminal itself end it with an error.
pub async fn run<S, R, W>(
    responder: &mut S,
    input: R,
    out: &mut W,
    banner: &Banner,
) -> Result<ExitReason>
where
    S: Responder,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    run_until(responder, input, out, banner, ctrl_c).await
}

/// Same as [`run`], but stops with [`ExitReason::Interrupted`] once `shutdown` resolves.
pub async fn run_until<S, R, W, F>(
    responder: &mut S,
    mut input: R,
    out: &mut W,
    banner: &Banner,
    shutdown: F,
) -> Result<ExitReason>
where
    S: Responder,
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    for line in &banner.intro {
        writeln!(out, "{line}")?;
    }

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut line = String::new();
        let read = tokio::select! {
            read = input.read_line(&mut line) => read,
            _ = &mut shutdown => {
                writeln!(out, "\n{FAREWELL}")?;
                return Ok(ExitReason::Interrupted);
            }
        };

        let read = match read {
            Ok(read) => read,
            // The undecodable line is already consumed.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                writeln!(out, "❌ Error: {e}\n")?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if read == 0 {
            writeln!(out, "\n{FAREWELL}")?;
            return Ok(ExitReason::EndOfInput);
        }

        let query = line.trim();
        if is_exit_command(query) {
            writeln!(out, "{FAREWELL}")?;
            return Ok(ExitReason::ExitCommand);
        }
        if query.is_empty() {
            continue;
        }

        writeln!(out, "{}", banner.thinking)?;
        out.flush()?;

        let result = tokio::select! {
            result = responder.respond(query) => result,
            _ = &mut shutdown => {
                writeln!(out, "\n{FAREWELL}")?;
                return Ok(ExitReason::Interrupted);
            }
        };

        match result {
            Ok(answer) => writeln!(out, "🏆 {}: {answer}\n", banner.speaker)?,
            Err(e) => writeln!(out, "❌ Error: {e}\n")?,
        }
    }
}
