//! The `pytutor init` command.

use std::path::Path;

use anyhow::Result;

use pytutor_core::config::sample_config;

pub fn execute() -> Result<()> {
    if Path::new("pytutor.toml").exists() {
        println!("pytutor.toml already exists, skipping.");
    } else {
        std::fs::write("pytutor.toml", sample_config())?;
        println!("Created pytutor.toml");
    }

    std::fs::create_dir_all("catalog")?;
    let example_path = Path::new("catalog/example.toml");
    if example_path.exists() {
        println!("catalog/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalog/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit catalog/example.toml or add your own catalog files");
    println!("  2. Run: pytutor validate --catalog catalog/example.toml");
    println!("  3. Run: pytutor verify --catalog catalog/example.toml");
    println!("  4. Set catalog_dir = \"./catalog\" in pytutor.toml and run: pytutor");

    Ok(())
}

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example Catalog"
description = "A small catalog to get started"
default_stage = "beginner"

[stages.beginner]
challenge_mastery = { achievement = "Example Graduate" }

[[challenges]]
id = "greeting"
title = "Greeting"
prompt = "Task: Create a variable 'name' with value 'Ada' and print 'Hello, Ada!'"
tiers = { full = 20, partial = 10, missing = 5, consolation = 5 }
reference_solution = """
name = "Ada"
print(f"Hello, {name}!")"""

[[challenges.checks]]
kind = "binding"
name = "name"
expected = "Ada"

[[challenges.checks]]
kind = "output_equals"
expected = "Hello, Ada!"

[[challenges]]
id = "double"
title = "Double It"
prompt = "Task: Define a function 'double(n)' that returns n * 2."
tiers = { full = 30, partial = 10, missing = 5, consolation = 5 }
reference_solution = """
def double(n):
    return n * 2"""

[[challenges.checks]]
kind = "defined"
name = "double"
is = "function"

[[challenges.checks]]
kind = "call"
requires = ["double"]
expression = "double(21)"
expected = 42

[[challenges.checks]]
kind = "call"
requires = ["double"]
expression = "double(1.25)"
expected = 2.5
tolerance = 0.001

[[lessons]]
id = "printing"
title = "Printing"
body = """
print() writes its arguments to the screen, separated by spaces.

  print("Hello", "world")   # Hello world"""

[[lessons.questions]]
prompt = "What does print(1, 2) show?"
choices = ["12", "1 2", "(1, 2)"]
answer = 2
explanation = "Arguments are separated by a single space."
"#;
