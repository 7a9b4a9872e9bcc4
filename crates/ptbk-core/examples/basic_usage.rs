//! Basic usage example for ptbk-core
//!
//! Run with: cargo run --example basic_usage

use ptbk_core::{
    extract_parameter_names, normalize_to_camel_case, title_to_name, validate_parameter_name,
    ParameterJson, PipelineJson, PromptTemplateJson,
};

fn main() {
    println!("=== Promptbook Core Basic Usage Example ===\n");

    // Example 1: Normalizing names
    println!("1. Normalizing Names:");
    for raw in ["{thing}", "`{customerName}`", "<my thing>"] {
        match validate_parameter_name(raw) {
            Ok(name) => println!("   {raw:<20} -> {name}"),
            Err(e) => println!("   {raw:<20} -> error: {e}"),
        }
    }
    println!("   camelCase of 'Hello world': {}", normalize_to_camel_case("Hello world"));
    println!("   name of '💬 Write a draft': {}\n", title_to_name("💬 Write a draft"));

    // Example 2: Finding parameter references
    println!("2. Parameter References:");
    let body = "Write a {tone} article about {topic} for {audience}.";
    println!("   Body: {body}");
    println!("   References: {:?}\n", extract_parameter_names(body));

    // Example 3: Building a pipeline by hand
    println!("3. Building a Pipeline:");
    let template = PromptTemplateJson::new("Write article", body, "article")
        .with_dependent("tone")
        .with_dependent("topic")
        .with_dependent("audience");

    let pipeline = PipelineJson::new("Article writer")
        .with_url("https://promptbook.example.com/samples/article.ptbk.md")
        .with_parameter(ParameterJson::input("tone"))
        .with_parameter(ParameterJson::input("topic"))
        .with_parameter(ParameterJson::input("audience"))
        .with_parameter(ParameterJson::output("article").with_description("Finished article"))
        .with_template(template);

    println!("   Title: {}", pipeline.title);
    println!("   Templates: {}", pipeline.prompt_templates.len());
    println!(
        "   Producer of {{article}}: {:?}\n",
        pipeline.producer_of("article").map(|t| t.title.as_str())
    );

    // Example 4: Serializing to JSON
    println!("4. Serializing to JSON:");
    match pipeline.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => println!("   error: {e}"),
    }

    println!("\n=== Example Complete ===");
}
