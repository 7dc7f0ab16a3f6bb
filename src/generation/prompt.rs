//! Prompt assembly from a query and its fragments

/// Marker the model continues from
pub const ANSWER_MARKER: &str = "Resposta:";

/// Format the prompt handed to the model.
///
/// ```text
/// Consulta: <query>
/// Informações relevantes:
/// <fragment 1>
/// ...
/// <fragment n>
/// Resposta:
/// ```
pub fn format_prompt(query: &str, fragments: &[String]) -> String {
    format!(
        "Consulta: {}\nInformações relevantes:\n{}\n{}",
        query,
        fragments.join("\n"),
        ANSWER_MARKER
    )
}
