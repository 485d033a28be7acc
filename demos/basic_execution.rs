//! Basic example of running snippets through the sandbox.
//!
//! Run with: cargo run --example basic_execution

use std::time::Duration;
use snippet_sandbox::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure the sandbox
    let config = SandboxConfig::builder()
        .timeout(Duration::from_secs(3))
        .loop_iteration_limit(50_000_000)
        .build();

    println!("Creating sandbox with config: {:?}", config);

    let sandbox = JsSandbox::new(config)?;
    let runner = CodeRunner::new(sandbox, RunnerConfig::default());

    let snippets = [
        ("console.log(1 + 1);", "javascript"),
        (
            "const user = { name: 'ada', langs: ['js', 'py'] };\nconsole.log('user', user);",
            "javascript",
        ),
        ("console.log('a'); throw new Error('boom');", "javascript"),
        ("window.location = 'https://example.com';", "javascript"),
        ("while (true) {}", "javascript"),
        ("name = 'ada'\nprint('hello')\nprint(name)", "python"),
        ("fn main() {}", "rust"),
    ];

    for (i, (source, language)) in snippets.iter().enumerate() {
        println!("\n=== Snippet {}: {} ===", i + 1, language);
        println!("{}", source);

        let request = ExecutionRequest::new(*source, *language);
        match runner.run_and_render(&request).await {
            Rendered::Output(text) => println!("--- output ---\n{}", text),
            Rendered::Error(text) => println!("--- error ---\n{}", text),
        }
    }

    Ok(())
}
