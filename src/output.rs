use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

/// User-facing terminal messages. Status lines carry a colored tag only when
/// the stream is a TTY; report lines (`print_user`) are always plain.
fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

/// True when stdin is an interactive terminal.
pub fn stdin_is_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

pub fn print_info(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Plain report line, no prefix. Scripts may parse these.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Ask a question on stdout and read one answer line from `input`.
/// Only an exact "yes" (case-insensitive, trimmed) counts as consent.
pub fn confirm<R: BufRead>(question: &str, input: &mut R) -> io::Result<bool> {
    if stdout_is_tty() {
        print!("{} {} [type 'yes' to continue] ", "confirm:".magenta().bold(), question);
    } else {
        print!("confirm: {} [type 'yes' to continue] ", question);
    }
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_accepts_only_yes() {
        assert!(confirm("go?", &mut Cursor::new("yes\n")).unwrap());
        assert!(confirm("go?", &mut Cursor::new("  YES  \n")).unwrap());
        assert!(!confirm("go?", &mut Cursor::new("y\n")).unwrap());
        assert!(!confirm("go?", &mut Cursor::new("")).unwrap());
    }
}
