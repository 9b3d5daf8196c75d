//! Plain-text presentation of published screen states.

use search_core::ScreenState;
use shared::protocol::SearchResult;

const UNKNOWN_ERROR: &str = "Unknown error";

pub fn render_state(state: &ScreenState) -> Vec<String> {
    match state {
        ScreenState::Loading => vec!["Searching...".to_string()],
        ScreenState::Success {
            results,
            total_count,
        } => {
            let mut lines = Vec::with_capacity(results.len() + 1);
            lines.push(format!("Number of results: {total_count}"));
            lines.extend(results.iter().map(render_result));
            lines
        }
        ScreenState::Error { message } if message.is_empty() => {
            vec![format!("Error: {UNKNOWN_ERROR}")]
        }
        ScreenState::Error { message } => vec![format!("Error: {message}")],
    }
}

fn render_result(result: &SearchResult) -> String {
    let mut line = format!("  {}", result.display_name());
    if let Some(stars) = result.stargazers_count {
        line.push_str(&format!(" [{stars} stars]"));
    }
    if let Some(language) = &result.language {
        line.push_str(&format!(" ({language})"));
    }
    if let Some(description) = result.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" - {description}"));
    }
    line
}
