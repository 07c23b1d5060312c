use fifa_agent::config::Variant;
use fifa_agent::error::{Error, Result};
use fifa_agent::repl::{self, Banner, ExitReason, Responder};
use std::time::Duration;
use tokio::io::BufReader;

/// Answers by echoing, fails on demand, and remembers what it was asked.
#[derive(Default)]
struct Scripted {
    asked: Vec<String>,
}

impl Responder for Scripted {
    async fn respond(&mut self, query: &str) -> Result<String> {
        self.asked.push(query.to_string());
        if query.contains("falla") {
            return Err(Error::api("gemini", "quota exceeded"));
        }
        Ok(format!("respuesta a '{query}'"))
    }
}

/// Never answers.
struct Stalled;

impl Responder for Stalled {
    async fn respond(&mut self, _query: &str) -> Result<String> {
        std::future::pending().await
    }
}

async fn drive(input: &str, variant: Variant) -> (Scripted, String, ExitReason) {
    drive_bytes(input.as_bytes(), variant).await
}

async fn drive_bytes(input: &[u8], variant: Variant) -> (Scripted, String, ExitReason) {
    let mut responder = Scripted::default();
    let mut out = Vec::new();
    let reason = repl::run(
        &mut responder,
        input,
        &mut out,
        &Banner::for_variant(variant),
    )
    .await
    .unwrap();
    (responder, String::from_utf8(out).unwrap(), reason)
}

#[tokio::test]
async fn exit_word_stops_the_loop() {
    let (responder, out, reason) =
        drive("¿Quién ganó en 2014?\nSALIR\nnunca leída\n", Variant::Classic).await;
    assert_eq!(reason, ExitReason::ExitCommand);
    assert_eq!(responder.asked, vec!["¿Quién ganó en 2014?"]);
    assert!(out.starts_with("🏆 FIFA World Cup Agent - ¡Pregúntame sobre la Copa del Mundo!"));
    assert!(out.contains("🤖 Gemini está procesando tu pregunta..."));
    assert!(out.contains("🏆 Agente: respuesta a '¿Quién ganó en 2014?'"));
    assert!(out.trim_end().ends_with("👋 ¡Hasta luego!"));
}

#[tokio::test]
async fn each_exit_word_works() {
    for word in ["salir", "exit", "quit", "  Quit  "] {
        let (responder, _, reason) = drive(&format!("{word}\n"), Variant::Classic).await;
        assert_eq!(reason, ExitReason::ExitCommand, "{word}");
        assert!(responder.asked.is_empty());
    }
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    let (responder, _, _) = drive("\n   \nhola\nexit\n", Variant::Classic).await;
    assert_eq!(responder.asked, vec!["hola"]);
}

#[tokio::test]
async fn errors_are_printed_and_loop_continues() {
    let (responder, out, reason) = drive("esto falla\nsigue\nquit\n", Variant::Plus).await;
    assert_eq!(reason, ExitReason::ExitCommand);
    assert_eq!(responder.asked, vec!["esto falla", "sigue"]);
    assert!(out.contains("❌ Error: API error (gemini): quota exceeded"));
    assert!(out.contains("🏆 Experto FIFA: respuesta a 'sigue'"));
}

#[tokio::test]
async fn end_of_input_exits_cleanly() {
    let (responder, out, reason) = drive("hola", Variant::Classic).await;
    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(responder.asked, vec!["hola"]);
    assert!(out.trim_end().ends_with("👋 ¡Hasta luego!"));
}

#[tokio::test]
async fn undecodable_line_is_reported_and_loop_continues() {
    let (responder, out, reason) = drive_bytes(b"caf\xff\nhola\nquit\n", Variant::Classic).await;
    assert_eq!(reason, ExitReason::ExitCommand);
    assert_eq!(responder.asked, vec!["hola"]);
    assert!(out.contains("❌ Error: stream did not contain valid UTF-8"));
    assert!(out.contains("🏆 Agente: respuesta a 'hola'"));
}

#[tokio::test]
async fn interrupt_while_waiting_for_input() {
    // The writer half stays open, so reads never complete.
    let (_writer, reader) = tokio::io::duplex(64);
    let mut responder = Scripted::default();
    let mut out = Vec::new();
    let reason = repl::run_until(
        &mut responder,
        BufReader::new(reader),
        &mut out,
        &Banner::for_variant(Variant::Classic),
        std::future::ready(()),
    )
    .await
    .unwrap();

    assert_eq!(reason, ExitReason::Interrupted);
    assert!(responder.asked.is_empty());
    let out = String::from_utf8(out).unwrap();
    assert!(out.trim_end().ends_with("👋 ¡Hasta luego!"));
}

#[tokio::test]
async fn interrupt_while_waiting_for_the_model() {
    let mut out = Vec::new();
    let reason = repl::run_until(
        &mut Stalled,
        "hola\n".as_bytes(),
        &mut out,
        &Banner::for_variant(Variant::Plus),
        tokio::time::sleep(Duration::from_millis(50)),
    )
    .await
    .unwrap();

    assert_eq!(reason, ExitReason::Interrupted);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("🤖 Gemini 2.5 Flash con herramientas procesando..."));
    assert!(!out.contains("Experto FIFA:"));
    assert!(out.trim_end().ends_with("👋 ¡Hasta luego!"));
}

/// A terminal whose output side is gone.
struct ClosedTerminal;

impl std::io::Write for ClosedTerminal {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdout closed",
        ))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn terminal_write_failure_ends_the_loop() {
    let mut responder = Scripted::default();
    let err = repl::run(
        &mut responder,
        "hola\n".as_bytes(),
        &mut ClosedTerminal,
        &Banner::for_variant(Variant::Classic),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    assert!(responder.asked.is_empty());
}
