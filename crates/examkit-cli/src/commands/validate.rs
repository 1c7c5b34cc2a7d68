//! The `examkit validate` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use examkit_core::model::QuestionBank;
use examkit_core::parser::{load_bank_directory, parse_question_bank, validate_question_bank};

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = if bank_path.is_dir() {
        load_bank_directory(&bank_path)?
    } else {
        vec![parse_question_bank(&bank_path)?]
    };
    if banks.is_empty() {
        anyhow::bail!("no question banks found in {}", bank_path.display());
    }

    let mut warning_count = 0;
    for bank in &banks {
        println!("Bank: {} ({} questions)", bank.name, bank.questions.len());
        println!("  {}", describe(bank));

        for warning in validate_question_bank(bank) {
            match &warning.question_id {
                Some(id) => println!("  [{id}] WARNING: {}", warning.message),
                None => println!("  WARNING: {}", warning.message),
            }
            warning_count += 1;
        }
    }

    if warning_count == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{warning_count} warning(s) found.");
    }
    Ok(())
}

/// Question types and total time, e.g. `mcq: 3, true_false: 1; 4m 30s total`.
fn describe(bank: &QuestionBank) -> String {
    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    for q in &bank.questions {
        *types.entry(q.question_type().to_string()).or_default() += 1;
    }
    let types: Vec<String> = types.iter().map(|(t, n)| format!("{t}: {n}")).collect();

    let total: u32 = bank.questions.iter().map(|q| q.time_limit).sum();
    format!("{}; {}m {}s total", types.join(", "), total / 60, total % 60)
}
