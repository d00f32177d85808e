//! Interactive yes/no confirmation on stdin.

use std::io::{self, BufRead, Write};

use rollwave_core::Confirmation;

/// Prompts on stdout and reads the answer from stdin, re-asking until the
/// input is recognizable. EOF or a read error counts as "no".
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("{prompt} [y/n]: ");
            let _ = io::stdout().flush();
            match lines.next() {
                Some(Ok(line)) => {
                    if let Some(answer) = parse_response(&line) {
                        return answer;
                    }
                }
                _ => return false,
            }
        }
    }
}

fn parse_response(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
