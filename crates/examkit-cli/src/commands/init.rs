//! The `examkit init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("examkit.toml").exists() {
        println!("examkit.toml already exists, skipping.");
    } else {
        std::fs::write("examkit.toml", SAMPLE_CONFIG)?;
        println!("Created examkit.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit examkit.toml if you use a question service");
    println!("  2. Run: examkit validate --bank banks/example.toml");
    println!("  3. Run: examkit take --bank banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkit configuration

# user_id = "student-1"
output_dir = "./examkit-results"

# Question generation and remote scoring service.
# [api]
# base_url = "https://exams.example.com/api"
# token = "${EXAMKIT_TOKEN}"
# timeout_secs = 30

[session]
reset_on_revisit = true
auto_submit_on_final_expiry = false
tick_ms = 1000
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small bank to get started"
difficulty = "basic"
default_time_limit = 60

[[questions]]
id = "capital-fr"
type = "mcq"
prompt = "What is the capital of France?"
options = ["Paris", "Rome", "Madrid", "Berlin"]
hint = "It is on the Seine."
correct_answer = "Paris"

[[questions]]
id = "earth-flat"
type = "true_false"
prompt = "The Earth is flat."
correct_answer = "False"
time_limit = 20

[[questions]]
id = "two-plus-two"
type = "short_answer"
prompt = "What is 2 + 2? Answer in digits."
correct_answer = "4"
time_limit = 30

[[questions]]
id = "why-tests"
type = "essay"
prompt = "Describe one benefit of writing automated tests."
time_limit = 300
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::parser::parse_question_bank_str;

    #[test]
    fn example_bank_parses() {
        let bank = parse_question_bank_str(EXAMPLE_BANK, Path::new("example.toml")).unwrap();
        assert_eq!(bank.questions.len(), 4);
        assert_eq!(bank.questions[1].time_limit, 20);
        assert_eq!(bank.questions[0].time_limit, 60);
    }

    #[test]
    fn sample_config_parses() {
        let config: examkit_providers::ExamkitConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert!(config.api.is_none());
        assert!(config.session.reset_on_revisit);
    }
}
