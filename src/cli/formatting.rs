//! Terminal formatting utilities using termimad for rich markdown rendering

use std::cell::Cell;
use termimad::crossterm::style::{Attribute, Color};
use termimad::{CompoundStyle, MadSkin, StyledChar};

thread_local! {
    /// Override for terminal detection in tests
    static FORCE_PLAIN_TEXT: Cell<bool> = Cell::new(false);
}

/// Force plain text output (for testing)
pub fn set_plain_text_mode(enabled: bool) {
    FORCE_PLAIN_TEXT.with(|f| f.set(enabled));
}

/// Initialize a MadSkin with the rectbind color scheme
pub fn create_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    let mut header_style = CompoundStyle::with_fg(Color::Cyan);
    header_style.add_attr(Attribute::Bold);
    skin.headers[0].compound_style = header_style;
    skin.headers[1].compound_style = CompoundStyle::with_fg(Color::Cyan);

    skin.bold.set_fg(Color::White);
    skin.inline_code.set_fg(Color::Yellow);
    skin.code_block.set_fg(Color::White);
    skin.bullet = StyledChar::from_fg_char(Color::Green, '▸');

    skin
}

/// Check if we're in a TTY (terminal) or if output is piped/redirected
pub fn is_terminal() -> bool {
    if FORCE_PLAIN_TEXT.with(|f| f.get()) {
        return false;
    }

    // Use terminal_size as a proxy for TTY detection
    terminal_size::terminal_size().is_some()
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Render markdown text with the rectbind skin
/// Falls back to plain text if not in a terminal
pub fn render_markdown(text: &str) -> String {
    if !is_terminal() {
        return text.to_string();
    }

    create_skin().text(text, Some(terminal_width())).to_string()
}

/// Render help text
pub fn render_help() -> String {
    let help_text = r#"
# rectbind

## Script statements
- **`r = Rectangle(x0, y0, x1, y1)`** — construct an object
- **`r.move(dx, dy)`** — call a method
- **`n = r.getArea()`** — keep a method's result
- **`print(r.getLength(), n)`** — print values
- **`del r`** — drop a variable

## Commands
- **`/classes`** — list bound classes and their methods
- **`/vars`** — list variables
- **`/config show`** — display current configuration
- **`/run <path>`** — run a script file in this session
- **`/help`** — show this help
- **`/quit`** — exit
"#;

    render_markdown(help_text)
}

/// Render the configuration summary
pub fn render_config(config_text: &str) -> String {
    if !is_terminal() {
        return config_text.to_string();
    }

    let formatted = format!("# Current Configuration\n\n```\n{}\n```", config_text);
    create_skin()
        .text(&formatted, Some(terminal_width()))
        .to_string()
}

/// Render a formatted list with custom bullet styling
pub fn render_list(title: &str, items: Vec<String>) -> String {
    if !is_terminal() {
        let mut output = format!("{}:\n", title);
        for item in items {
            output.push_str(&format!("  - {}\n", item));
        }
        return output;
    }

    let mut formatted = format!("## {}\n\n", title);
    for item in items {
        formatted.push_str(&format!("- {}\n", item));
    }

    create_skin()
        .text(&formatted, Some(terminal_width()))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_list() {
        set_plain_text_mode(true);
        let out = render_list("Variables", vec!["a = 1".into(), "b = 2".into()]);
        assert_eq!(out, "Variables:\n  - a = 1\n  - b = 2\n");
    }

    #[test]
    fn test_plain_help_mentions_commands() {
        set_plain_text_mode(true);
        let help = render_help();
        assert!(help.contains("/classes"));
        assert!(help.contains("Rectangle(x0, y0, x1, y1)"));
    }

    #[test]
    fn test_plain_config_is_unchanged() {
        set_plain_text_mode(true);
        assert_eq!(render_config("Logging Level: info\n"), "Logging Level: info\n");
    }

    #[test]
    fn test_skin_builds() {
        let _ = create_skin();
    }
}
