use std::io::IsTerminal;

use anstyle::{AnsiColor, Style};

fn rich_output() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

fn colorize(style: Style, text: &str) -> String {
    format!("{style}{text}{}", style.render_reset())
}

fn status_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::Green.into())).bold()
}

fn warn_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::Yellow.into())).bold()
}

pub fn status(label: &str, message: &str) {
    if rich_output() {
        println!("{} {message}", colorize(status_style(), label));
    } else {
        println!("{label} {message}");
    }
}

pub fn warn(message: &str) {
    if rich_output() {
        eprintln!("{} {message}", colorize(warn_style(), "warning:"));
    } else {
        eprintln!("warning: {message}");
    }
}
